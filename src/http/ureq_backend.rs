use std::time::Duration;

use tracing::debug;

use crate::config::USER_AGENT;

use super::{describe, Error, Response, Transport};

pub struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    pub fn new(timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build();

        Self { agent }
    }
}

impl Transport for UreqTransport {
    fn get(&self, url: &str, query: &[(&str, &str)]) -> Result<Response, Error> {
        debug!("GET {}", describe(url, query));

        let mut request = self.agent.get(url);
        for (param, value) in query {
            request = request.query(param, value);
        }

        request
            .call()
            .map_err(|e| match e {
                ureq::Error::Status(code, resp) => Error::Status(
                    code,
                    Response {
                        status: code,
                        reader: resp.into_reader(),
                    },
                ),
                ureq::Error::Transport(tp) => Error::Transport(tp.to_string().into()),
            })
            .map(|resp| Response {
                status: resp.status(),
                reader: resp.into_reader(),
            })
    }
}
