use std::net::IpAddr;

use quick_xml::events::Event;
use quick_xml::Reader;
use tracing::{debug, info, warn};

use crate::http::{Error, Response, Transport};
use crate::ip::PublicAddresses;
use crate::util::split_host;

use super::{
    DdnsService, DdnsUpdateError, Record, RecordKind, Records, UpdateOutcome, UNKNOWN_HOST,
};

/// The reply code NameSilo uses for a successful operation.
const SUCCESS_CODE: &str = "300";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    /// Base URL of the API, e.g. `https://www.namesilo.com/api`.
    pub api_url: Box<str>,

    pub api_key: Box<str>,

    pub domain: Box<str>,

    /// Send updates even for records that already hold the current address.
    pub force: bool,

    /// Decide what would be updated, but never send an update.
    pub dry_run: bool,
}

pub struct Service<T> {
    config: Config,
    transport: T,
}

#[derive(Debug, Default)]
struct Reply {
    code: Option<Box<str>>,
    detail: Option<Box<str>>,
    records: Vec<Record>,
}

impl<T: Transport> Service<T> {
    pub fn new(config: Config, transport: T) -> Self {
        Self { config, transport }
    }

    fn parse_error(error: Error) -> DdnsUpdateError {
        match error {
            Error::Status(code, _resp) => DdnsUpdateError::Status(code),
            Error::Transport(t) => DdnsUpdateError::TransportError(t),
        }
    }

    /// Calls an API operation. The version, reply format and key parameters
    /// are added here; `params` carries the operation-specific ones.
    fn call(&self, operation: &str, params: &[(&str, &str)]) -> Result<Response, DdnsUpdateError> {
        let url = format!(
            "{}/{}",
            self.config.api_url.trim_end_matches('/'),
            operation
        );

        let mut query = vec![
            ("version", "1"),
            ("type", "xml"),
            ("key", &*self.config.api_key),
        ];
        query.extend_from_slice(params);

        self.transport.get(&url, &query).map_err(Self::parse_error)
    }
}

impl<T: Transport> DdnsService for Service<T> {
    /// See: https://www.namesilo.com/api-reference#dns/dns-list-records
    fn list_records(&self) -> Result<Records, DdnsUpdateError> {
        let response = self.call("dnsListRecords", &[("domain", &*self.config.domain)])?;
        let body = response.into_string().map_err(xml_error)?;
        let reply = parse_reply(&body)?;

        if let Some(code) = reply.code {
            if &*code != SUCCESS_CODE {
                return Err(DdnsUpdateError::Api(code, reply.detail.unwrap_or_default()));
            }
        }

        let records = reply.records.into_iter().collect::<Records>();

        info!("Listed {} record(s) of {}", records.len(), self.config.domain);

        Ok(records)
    }

    /// See: https://www.namesilo.com/api-reference#dns/dns-update-record
    fn update_record(
        &self,
        record: &Record,
        addresses: &PublicAddresses,
    ) -> Result<UpdateOutcome, DdnsUpdateError> {
        let ip = match record.kind() {
            RecordKind::A => addresses.ipv4.map(IpAddr::from),
            RecordKind::Aaaa => addresses.ipv6.map(IpAddr::from),
            RecordKind::Other(_) => return Ok(UpdateOutcome::Skipped),
        };

        let host = record.host()?;
        let ttl = record.ttl()?;

        let Some(ip) = ip else {
            warn!(
                "No public address for {} record {}, leaving it alone",
                record.kind_name(),
                host
            );
            return Ok(UpdateOutcome::NoAddress);
        };

        // Compare parsed addresses, IPv6 has more than one spelling.
        if !self.config.force && record.value().parse::<IpAddr>().ok() == Some(ip) {
            debug!("{} already points at {}", host, ip);
            return Ok(UpdateOutcome::Unchanged);
        }

        let value = ip.to_string();
        let (domain, subdomain) = split_host(host);

        if self.config.dry_run {
            info!("Dry run: would point {} from {:?} to {}", host, record.value(), value);
            return Ok(UpdateOutcome::DryRun);
        }

        info!("Pointing {} from {:?} to {}", host, record.value(), value);

        let response = self.call(
            "dnsUpdateRecord",
            &[
                ("domain", domain),
                ("rrid", record.id()),
                ("rrhost", subdomain),
                ("rrvalue", value.as_str()),
                ("rrttl", ttl),
            ],
        )?;

        if response.status() != 200 {
            return Err(DdnsUpdateError::Status(response.status()));
        }

        // NameSilo reports refusals with HTTP 200, so a readable reply code
        // still has the last word. Anything unreadable counts as success.
        let body = response.into_string().unwrap_or_default();
        match parse_reply(&body) {
            Ok(Reply {
                code: Some(code),
                detail,
                ..
            }) if &*code != SUCCESS_CODE => {
                Err(DdnsUpdateError::Api(code, detail.unwrap_or_default()))
            }
            Ok(_) => Ok(UpdateOutcome::Updated),
            Err(e) => {
                debug!("Update reply for {} is not readable XML: {}", host, e);
                Ok(UpdateOutcome::Updated)
            }
        }
    }
}

fn xml_error(error: impl std::fmt::Display) -> DdnsUpdateError {
    DdnsUpdateError::Xml(error.to_string().into())
}

/// Whether `path` (which includes the root element) is exactly the root
/// followed by `below_root`.
fn is_at(path: &[Vec<u8>], below_root: &[&[u8]]) -> bool {
    path.len() == below_root.len() + 1
        && path[1..]
            .iter()
            .zip(below_root)
            .all(|(element, expected)| element.as_slice() == *expected)
}

fn element_name(name: &[u8]) -> Result<Box<str>, DdnsUpdateError> {
    std::str::from_utf8(name).map(Box::from).map_err(xml_error)
}

/// Reads a NameSilo XML reply:
///
/// ```text
/// <namesilo>
///   <request>...</request>
///   <reply>
///     <code>300</code>
///     <detail>success</detail>
///     <resource_record>
///       <record_id>..</record_id> <type>..</type> <host>..</host> ...
///     </resource_record>
///     ...
///   </reply>
/// </namesilo>
/// ```
fn parse_reply(xml: &str) -> Result<Reply, DdnsUpdateError> {
    const REPLY: &[&[u8]] = &[b"reply"];
    const RECORD: &[&[u8]] = &[b"reply", b"resource_record"];
    const CODE: &[&[u8]] = &[b"reply", b"code"];
    const DETAIL: &[&[u8]] = &[b"reply", b"detail"];

    let mut reader = Reader::from_str(xml);
    let mut reply = Reply::default();

    let mut path: Vec<Vec<u8>> = Vec::new();
    let mut text = String::new();
    let mut fields: Vec<(Box<str>, Box<str>)> = Vec::new();
    let mut seen_root = false;

    loop {
        match reader.read_event().map_err(xml_error)? {
            Event::Start(e) => {
                if path.is_empty() && seen_root {
                    return Err(xml_error("more than one root element"));
                }
                seen_root = true;

                path.push(e.name().as_ref().to_vec());
                text.clear();

                if is_at(&path, RECORD) {
                    fields.clear();
                }
            }

            Event::Empty(e) => {
                if path.is_empty() && seen_root {
                    return Err(xml_error("more than one root element"));
                }
                seen_root = true;

                if is_at(&path, RECORD) {
                    fields.push((element_name(e.name().as_ref())?, "".into()));
                } else if is_at(&path, REPLY) && e.name().as_ref() == b"resource_record" {
                    return Err(DdnsUpdateError::MissingField(UNKNOWN_HOST.into(), "record_id"));
                }
            }

            Event::Text(e) => text.push_str(&e.unescape().map_err(xml_error)?),

            Event::CData(e) => {
                let data = e.into_inner();
                text.push_str(std::str::from_utf8(&data).map_err(xml_error)?);
            }

            Event::End(_) => {
                if path.len() == RECORD.len() + 2 && is_at(&path[..path.len() - 1], RECORD) {
                    let name = element_name(&path[path.len() - 1])?;
                    fields.push((name, text.as_str().into()));
                } else if is_at(&path, RECORD) {
                    reply.records.push(Record::from_fields(fields.drain(..))?);
                } else if is_at(&path, CODE) {
                    reply.code = Some(text.trim().into());
                } else if is_at(&path, DETAIL) {
                    reply.detail = Some(text.trim().into());
                }

                path.pop();
                text.clear();
            }

            Event::Eof => break,

            _ => (),
        }
    }

    if !seen_root {
        return Err(xml_error("no root element"));
    }

    if !path.is_empty() {
        return Err(xml_error("unexpected end of document"));
    }

    Ok(reply)
}
