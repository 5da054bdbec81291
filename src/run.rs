use std::io::{self, Write};

use thiserror::Error;
use tracing::debug;

use crate::http::Transport;
use crate::ip::{self, Endpoints};
use crate::services::{DdnsService, DdnsUpdateError, UpdateOutcome};

#[derive(Debug, Error)]
pub enum RunError {
    #[error("{0}")]
    Registrar(#[from] DdnsUpdateError),

    #[error("unable to write status: {0}")]
    Output(#[from] io::Error),
}

/// How many records ended up in which state.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    pub updated: usize,
    pub untouched: usize,
}

/// A single pass: look up the public addresses, list the domain's records
/// and bring every A/AAAA record up to date in listing order, writing one
/// status line per record to `out`. Stops at the first failing record.
pub fn execute(
    transport: &impl Transport,
    endpoints: &Endpoints,
    service: &impl DdnsService,
    out: &mut impl Write,
) -> Result<Summary, RunError> {
    let addresses = ip::resolve(transport, endpoints);
    let records = service.list_records()?;

    let mut summary = Summary::default();

    for record in records.iter() {
        debug!("Record {}: {:?}", record.id(), record.fields().collect::<Vec<_>>());

        let outcome = service.update_record(record, &addresses)?;

        match outcome {
            UpdateOutcome::Updated => summary.updated += 1,
            _ => summary.untouched += 1,
        }

        writeln!(
            out,
            "DNS record {} of type {} {}",
            record.get("host").unwrap_or_default(),
            record.kind_name(),
            outcome
        )?;
    }

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::testing::FakeTransport;
    use crate::services::namesilo::{Config, Service};

    const V4: &str = "https://v4.test";
    const V6: &str = "https://v6.test";
    const LIST_URL: &str = "https://api.test/dnsListRecords";
    const UPDATE_URL: &str = "https://api.test/dnsUpdateRecord";

    fn endpoints() -> Endpoints {
        Endpoints {
            ipv4: V4.into(),
            ipv6: V6.into(),
        }
    }

    fn run(transport: &FakeTransport) -> (Result<Summary, RunError>, String) {
        let service = Service::new(
            Config {
                api_url: "https://api.test".into(),
                api_key: "secret".into(),
                domain: "example.com".into(),
                force: false,
                dry_run: false,
            },
            transport,
        );

        let mut out = Vec::new();
        let result = execute(transport, &endpoints(), &service, &mut out);
        (result, String::from_utf8(out).unwrap())
    }

    fn listing(records: &str) -> String {
        format!(
            "<namesilo><reply><code>300</code><detail>success</detail>{}</reply></namesilo>",
            records
        )
    }

    fn record(id: &str, kind: &str, host: &str, value: &str) -> String {
        format!(
            "<resource_record><record_id>{}</record_id><type>{}</type><host>{}</host>\
             <value>{}</value><ttl>7207</ttl><distance>0</distance></resource_record>",
            id, kind, host, value
        )
    }

    #[test]
    fn only_the_a_record_is_updated() {
        let body = listing(&[
            record("1", "A", "home.example.com", "198.51.100.1"),
            record("2", "TXT", "example.com", "hello"),
        ].concat());
        let transport = FakeTransport::new()
            .reply(V4, 200, "1.2.3.4\n")
            .fail(V6, "no route to host")
            .reply(LIST_URL, 200, &body)
            .reply(UPDATE_URL, 200, "");

        let (result, out) = run(&transport);

        let updates = transport.sent_to(UPDATE_URL);
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].param("rrid"), Some("1"));
        assert_eq!(updates[0].param("rrvalue"), Some("1.2.3.4"));
        assert_eq!(updates[0].param("rrhost"), Some("home"));
        assert!(updates.iter().all(|u| u.param("rrid") != Some("2")));

        assert_eq!(
            out,
            "DNS record home.example.com of type A updated successfully\n\
             DNS record example.com of type TXT skipped\n"
        );
        assert_eq!(
            result.unwrap(),
            Summary {
                updated: 1,
                untouched: 1
            }
        );
    }

    #[test]
    fn calls_happen_in_order() {
        let body = listing(&record("1", "AAAA", "v6.example.com", "2001:db8::dead"));
        let transport = FakeTransport::new()
            .reply(V4, 200, "1.2.3.4")
            .reply(V6, 200, "2001:db8::1")
            .reply(LIST_URL, 200, &body)
            .reply(UPDATE_URL, 200, "");

        run(&transport).0.unwrap();

        let urls = transport.sent().into_iter().map(|s| s.url).collect::<Vec<_>>();
        assert_eq!(urls, [V4, V6, LIST_URL, UPDATE_URL]);
    }

    #[test]
    fn listing_failure_aborts_before_any_update() {
        let transport = FakeTransport::new()
            .reply(V4, 200, "1.2.3.4")
            .reply(V6, 200, "2001:db8::1")
            .fail(LIST_URL, "connection refused")
            .reply(UPDATE_URL, 200, "");

        let (result, out) = run(&transport);

        assert!(matches!(
            result,
            Err(RunError::Registrar(DdnsUpdateError::TransportError(_)))
        ));
        assert!(transport.sent_to(UPDATE_URL).is_empty());
        assert!(out.is_empty());
    }

    #[test]
    fn update_failure_leaves_later_records_alone() {
        let body = listing(&[
            record("1", "A", "a.example.com", "198.51.100.1"),
            record("2", "A", "b.example.com", "198.51.100.1"),
        ].concat());
        let transport = FakeTransport::new()
            .reply(V4, 200, "1.2.3.4")
            .reply(LIST_URL, 200, &body)
            .reply(UPDATE_URL, 500, "");

        let (result, out) = run(&transport);

        assert!(matches!(
            result,
            Err(RunError::Registrar(DdnsUpdateError::Status(500)))
        ));
        let updates = transport.sent_to(UPDATE_URL);
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].param("rrid"), Some("1"));
        assert!(out.is_empty());
    }

    #[test]
    fn records_are_processed_in_listing_order() {
        let body = listing(&[
            record("9", "A", "a.example.com", "198.51.100.1"),
            record("10", "TXT", "example.com", "hello"),
            record("1", "A", "b.example.com", "198.51.100.1"),
        ].concat());
        let transport = FakeTransport::new()
            .reply(V4, 200, "1.2.3.4")
            .reply(LIST_URL, 200, &body)
            .reply(UPDATE_URL, 200, "");

        let (result, out) = run(&transport);

        assert!(result.is_ok());
        let ids = transport
            .sent_to(UPDATE_URL)
            .iter()
            .map(|u| u.param("rrid").unwrap_or_default().to_owned())
            .collect::<Vec<_>>();
        assert_eq!(ids, ["9", "1"]);
        assert_eq!(
            out,
            "DNS record a.example.com of type A updated successfully\n\
             DNS record example.com of type TXT skipped\n\
             DNS record b.example.com of type A updated successfully\n"
        );
    }

    #[test]
    fn missing_ipv4_sends_no_a_updates() {
        let body = listing(&record("1", "A", "home.example.com", "198.51.100.1"));
        let transport = FakeTransport::new()
            .fail(V4, "timed out")
            .reply(V6, 200, "2001:db8::1")
            .reply(LIST_URL, 200, &body);

        let (result, out) = run(&transport);

        assert!(transport.sent_to(UPDATE_URL).is_empty());
        assert_eq!(
            out,
            "DNS record home.example.com of type A skipped (no public address)\n"
        );
        assert_eq!(result.unwrap().untouched, 1);
    }

    #[test]
    fn up_to_date_records_are_reported() {
        let body = listing(&record("1", "A", "home.example.com", "1.2.3.4"));
        let transport = FakeTransport::new()
            .reply(V4, 200, "1.2.3.4")
            .reply(LIST_URL, 200, &body);

        let (result, out) = run(&transport);

        assert!(result.is_ok());
        assert!(transport.sent_to(UPDATE_URL).is_empty());
        assert_eq!(out, "DNS record home.example.com of type A is already up to date\n");
    }
}
