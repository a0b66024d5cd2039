//! Element-set retrieval from Celestrak.

use anyhow::{anyhow, bail, Context, Result};
use orbital_mechanics::ElementSet;
use std::time::Duration;
use tracing::{debug, warn};

const GP_URL: &str = "https://celestrak.org/NORAD/elements/gp.php";
const MAX_RETRIES: u32 = 3;
const RETRY_DELAY_SECONDS: u64 = 2;
const REQUEST_TIMEOUT_SECONDS: u64 = 30;

/// Shared HTTP client with the request timeout applied.
pub fn client() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECONDS))
        .build()
        .context("failed to build HTTP client")
}

/// Fetch the current element set for one catalog number.
///
/// Transient transport failures are retried a fixed number of times with a
/// linear backoff; a well-formed response with fewer than two element lines
/// is malformed data and is not retried.
pub async fn fetch_elements(client: &reqwest::Client, norad_id: u32) -> Result<ElementSet> {
    let url = format!("{GP_URL}?CATNR={norad_id}&FORMAT=TLE");

    for attempt in 1..=MAX_RETRIES {
        if attempt > 1 {
            let delay = Duration::from_secs(RETRY_DELAY_SECONDS * u64::from(attempt));
            debug!(
                "Retrying catalog {} after {:?} (attempt {}/{})",
                norad_id, delay, attempt, MAX_RETRIES
            );
            tokio::time::sleep(delay).await;
        }

        match fetch_attempt(client, &url, norad_id).await {
            Ok(body) => return parse_gp_response(&body, norad_id),
            Err(e) if attempt == MAX_RETRIES => return Err(e),
            Err(e) => warn!(
                "Attempt {}/{} failed for catalog {}: {:#}",
                attempt, MAX_RETRIES, norad_id, e
            ),
        }
    }

    Err(anyhow!(
        "failed to fetch element set for catalog {} after {} attempts",
        norad_id,
        MAX_RETRIES
    ))
}

async fn fetch_attempt(client: &reqwest::Client, url: &str, norad_id: u32) -> Result<String> {
    let response = client
        .get(url)
        .send()
        .await
        .with_context(|| format!("request failed for catalog {norad_id}"))?;

    if !response.status().is_success() {
        bail!("HTTP {} for catalog {}", response.status(), norad_id);
    }

    response
        .text()
        .await
        .with_context(|| format!("cannot read response body for catalog {norad_id}"))
}

/// Parse a GP response: an optional name line followed by the two element
/// lines. Celestrak answers `No GP data found` for unknown catalog numbers,
/// which lands in the fewer-than-two-lines case.
fn parse_gp_response(body: &str, norad_id: u32) -> Result<ElementSet> {
    let lines: Vec<&str> = body
        .lines()
        .map(str::trim_end)
        .filter(|line| !line.is_empty())
        .collect();

    let (name, elements) = match lines.as_slice() {
        [name, rest @ ..] if !name.starts_with('1') => (Some(name.trim().to_string()), rest),
        rest => (None, rest),
    };

    match elements {
        [line1, line2, ..] if line1.starts_with('1') && line2.starts_with('2') => Ok(ElementSet {
            name,
            line1: (*line1).to_string(),
            line2: (*line2).to_string(),
        }),
        _ => bail!(
            "incomplete element set for catalog {} ({} usable lines)",
            norad_id,
            lines.len()
        ),
    }
}
