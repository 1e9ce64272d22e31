use crate::errors::StatsError;

/// HTTP status that means "nothing here" rather than a failure.
const NOT_FOUND: u16 = 404;
/// HTTP status for a successful response without a body.
const NO_CONTENT: u16 = 204;

/// Single GET attempt against `url`.
///
/// 404 maps to `Ok(None)`; 204 maps to an empty body. Any other non-success
/// status or transport failure is a `Fetch` error tagged with `source_id`.
pub fn get_optional(source_id: &str, url: &str) -> Result<Option<String>, StatsError> {
    let response = match ureq::get(url).call() {
        Ok(response) => response,
        Err(ureq::Error::StatusCode(NOT_FOUND)) => return Ok(None),
        Err(err) => {
            return Err(StatsError::Fetch {
                source_id: source_id.to_string(),
                reason: format!("GET {url} failed: {err}"),
            });
        }
    };
    if response.status().as_u16() == NO_CONTENT {
        return Ok(Some(String::new()));
    }
    let body = response
        .into_body()
        .read_to_string()
        .map_err(|err| StatsError::Fetch {
            source_id: source_id.to_string(),
            reason: format!("failed reading response body from {url}: {err}"),
        })?;
    Ok(Some(body))
}

