use anyhow::{Context, Result, bail};
use opticore_services::{VisionClient, unwrap_envelope};
use std::fs;
use std::path::Path;

pub async fn run(
    image: Option<&Path>,
    url: Option<&str>,
    prompt_extra: &str,
    desc: Option<&str>,
) -> Result<()> {
    let client = VisionClient::try_from_env()?;

    let raw = match (image, url) {
        (Some(path), _) => {
            let bytes = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
            client.describe_image(&bytes, mime_for(path), prompt_extra).await?
        }
        (None, Some(url)) => client.describe_url(url, desc).await?,
        (None, None) => bail!("provide --image or --url"),
    };

    let product = unwrap_envelope(raw);
    println!("{}", serde_json::to_string_pretty(&product)?);
    Ok(())
}

fn mime_for(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "png" => Some("image/png"),
        "webp" => Some("image/webp"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mime_is_derived_from_the_extension() {
        assert_eq!(mime_for(Path::new("a.PNG")), Some("image/png"));
        assert_eq!(mime_for(Path::new("a.jpeg")), Some("image/jpeg"));
        assert_eq!(mime_for(Path::new("a.bin")), None);
        assert_eq!(mime_for(Path::new("noext")), None);
    }
}
