use anyhow::Result;
use opticore_services::BannerClient;

pub async fn run(job_id: &str) -> Result<()> {
    let client = BannerClient::try_from_env()?;
    let poll = client.fetch_status(job_id).await;
    match poll.banner_url {
        Some(url) => println!("Banner ready: {url}"),
        None => println!(
            "Job {job_id}: {}",
            poll.status.as_deref().unwrap_or("no status reported")
        ),
    }
    Ok(())
}
