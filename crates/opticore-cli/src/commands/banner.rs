use anyhow::{Context, Result};
use opticore_services::{BannerClient, BannerOutcome, BannerRequest};
use std::fs;
use std::path::Path;

pub async fn run(image1: &Path, image2: &Path, prompt: &str) -> Result<()> {
    let client = BannerClient::try_from_env()?;
    let request = BannerRequest {
        image1: fs::read(image1).with_context(|| format!("reading {}", image1.display()))?,
        image2: fs::read(image2).with_context(|| format!("reading {}", image2.display()))?,
        prompt: prompt.to_string(),
    };

    match client.generate(&request).await? {
        BannerOutcome::Ready(url) => println!("Banner ready: {url}"),
        BannerOutcome::Pending { job_id } => {
            println!("Banner still rendering.");
            println!("Check later with: opticore status --job-id {job_id}");
        }
    }
    Ok(())
}
