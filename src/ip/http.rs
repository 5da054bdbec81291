use std::str::FromStr;

use crate::http::{Error, Transport};

use super::DynamicIpError;

/// Fetches `url` and reads the trimmed body as an address of type `A`.
pub(super) fn get_address<A: FromStr>(
    transport: &impl Transport,
    url: &str,
) -> Result<A, DynamicIpError> {
    let response = match transport.get(url, &[]) {
        Ok(r) => r,
        Err(Error::Status(code, response)) => {
            let body = response.into_string().unwrap_or_default();
            Err(DynamicIpError::HttpFailure(
                format!("HTTP {} {}", code, body.trim()).into(),
            ))?
        }
        Err(Error::Transport(t)) => Err(DynamicIpError::HttpFailure(t))?,
    };

    let text = response
        .into_string()
        .map_err(|e| DynamicIpError::HttpFailure(e.to_string().into()))?;

    let addr = text.trim();

    addr.parse::<A>()
        .map_err(|_| DynamicIpError::InvalidAddress(addr.into()))
}
