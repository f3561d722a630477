//! In-memory transport for exercising the request builders.

use std::{sync::Mutex, time::Duration};

use super::PayClient;
use crate::{
    config::{ClientCertConfig, MerchantConfig},
    error::{PayError, Result},
    sign::{SIGN_FIELD, SignType, sign},
    transport::{Transport, TransportResponse, XmlRequest, sealed},
    value::{ParamMap, Value, XmlMap},
    xml,
};

pub(crate) const KEY: &str = "secretkey";

/// What the stub saw for one call.
#[derive(Debug, Clone)]
pub(crate) struct RecordedRequest {
    pub url: String,
    pub body: String,
    pub identity: Option<ClientCertConfig>,
    pub timeout: Option<Duration>,
}

impl RecordedRequest {
    pub(crate) fn fields(&self) -> XmlMap {
        xml::decode(&self.body).unwrap()
    }
}

/// Records each request and answers with a canned reply.
#[derive(Debug)]
pub(crate) struct StubTransport {
    reply: std::result::Result<String, String>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl StubTransport {
    pub(crate) fn replying(body: String) -> Self {
        Self { reply: Ok(body), requests: Mutex::new(Vec::new()) }
    }

    pub(crate) fn failing(message: &str) -> Self {
        Self { reply: Err(message.to_owned()), requests: Mutex::new(Vec::new()) }
    }

    pub(crate) fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub(crate) fn last_request(&self) -> RecordedRequest {
        self.requests.lock().unwrap().last().cloned().unwrap()
    }
}

impl sealed::private::Sealed for StubTransport {}

impl Transport for StubTransport {
    async fn post_xml<'a>(&'a self, request: XmlRequest<'a>) -> Result<TransportResponse> {
        self.requests.lock().unwrap().push(RecordedRequest {
            url: request.url,
            body: request.body,
            identity: request.identity.cloned(),
            timeout: request.timeout,
        });

        match &self.reply {
            Ok(body) => Ok(TransportResponse { status: 200, body: body.clone() }),
            Err(message) => Err(PayError::TransportError(message.clone())),
        }
    }

    fn protocol_name(&self) -> &'static str {
        "stub"
    }
}

pub(crate) fn test_config() -> MerchantConfig {
    MerchantConfig::new("wx123", "10000100", KEY)
}

pub(crate) fn test_client(transport: StubTransport) -> PayClient<StubTransport> {
    PayClient::with_transport(test_config(), transport).unwrap()
}

/// Builds a reply document signed with [`KEY`] using MD5.
pub(crate) fn signed_reply(fields: &[(&str, &str)]) -> String {
    signed_reply_with(fields, SignType::Md5)
}

/// Builds a reply document signed with [`KEY`].
pub(crate) fn signed_reply_with(fields: &[(&str, &str)], sign_type: SignType) -> String {
    let mut reply: ParamMap = fields.iter().map(|(k, v)| ((*k).to_owned(), Value::from(*v))).collect();
    let signature = sign(&reply, KEY, sign_type).unwrap();
    reply.insert(SIGN_FIELD.to_owned(), Value::from(signature));
    xml::encode(xml::ROOT, &reply)
}
