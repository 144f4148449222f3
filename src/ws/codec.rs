//! Streamer frame codec.
//!
//! Inbound frames are JSON objects with exactly one of three top-level keys:
//!
//! - `response`: answers to commands, matched to callers by `requestid`
//! - `data`: subscription pushes with positional (integer-keyed) fields
//! - `notify`: heartbeats and session notices
//!
//! [`decode`] classifies a frame into an [`Envelope`]; [`relabel`] rewrites the
//! integer keys of one data item into field names using [`crate::ws::fields`].
//! Outbound command frames are built by [`encode_request`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::error::{Result, SchwabError};
use crate::types::StreamerInfo;
use crate::types::enums::{Command, Service};
use crate::ws::fields;

// ---------------------------------------------------------------------------
// Inbound envelopes
// ---------------------------------------------------------------------------

/// Top-level classification of an inbound frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Envelope {
    Response(Vec<ResponseEntry>),
    Data(Vec<DataEntry>),
    Notify(Vec<NotifyEntry>),
    /// Valid JSON without a recognised top-level key.
    Unclassified(String),
}

/// One element of a `response` array.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ResponseEntry {
    #[serde(default)]
    pub service: String,
    #[serde(default)]
    pub command: String,
    /// Echo of the request id; the streamer sends it as a string.
    #[serde(default, rename = "requestid", deserialize_with = "de_request_id")]
    pub request_id: Option<u64>,
    #[serde(default)]
    pub timestamp: Option<i64>,
    /// `{code, msg}` plus whatever else the streamer attached.
    #[serde(default)]
    pub content: Value,
}

impl ResponseEntry {
    /// The response code, if present and numeric.
    pub fn code(&self) -> Option<i64> {
        self.content.get("code").and_then(Value::as_i64)
    }

    /// The response message, or an empty string.
    pub fn message(&self) -> &str {
        self.content
            .get("msg")
            .and_then(Value::as_str)
            .unwrap_or_default()
    }
}

/// One element of a `data` array.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DataEntry {
    pub service: String,
    #[serde(default)]
    pub timestamp: i64,
    #[serde(default)]
    pub command: String,
    #[serde(default)]
    pub content: Vec<Map<String, Value>>,
}

/// One element of a `notify` array.
#[derive(Debug, Clone, PartialEq)]
pub enum NotifyEntry {
    Heartbeat(Heartbeat),
    /// Any other notice, e.g. a `STOP_STREAMING` content block.
    Other(Value),
}

/// Server keep-alive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Heartbeat {
    /// Server time in epoch milliseconds.
    pub millis: i64,
}

impl Heartbeat {
    pub fn time(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.millis)
    }
}

// ---------------------------------------------------------------------------
// Decoded message delivered to handlers
// ---------------------------------------------------------------------------

/// A relabeled data push.
///
/// `content` keeps the frame order and may carry updates for several symbols.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StreamMessage {
    pub service: String,
    pub command: String,
    /// Epoch milliseconds.
    pub timestamp: i64,
    pub content: Vec<Map<String, Value>>,
}

impl StreamMessage {
    /// The service as a typed value, if it is one this crate knows.
    pub fn service_kind(&self) -> Option<Service> {
        self.service.parse().ok()
    }

    /// The frame timestamp as a UTC time.
    pub fn time(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.timestamp)
    }
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

/// Classify a raw text frame.
///
/// Invalid JSON, or a recognised envelope whose body has the wrong shape, is
/// a [`SchwabError::Decode`]. Valid JSON that is not one of the three
/// envelopes is [`Envelope::Unclassified`].
pub fn decode(raw: &str) -> Result<Envelope> {
    let decode_err = |source| SchwabError::Decode {
        raw: raw.to_owned(),
        source,
    };

    let value: Value = serde_json::from_str(raw).map_err(decode_err)?;
    let Value::Object(mut obj) = value else {
        return Ok(Envelope::Unclassified(raw.to_owned()));
    };

    if let Some(body) = obj.remove("response") {
        return serde_json::from_value(body)
            .map(Envelope::Response)
            .map_err(decode_err);
    }
    if let Some(body) = obj.remove("data") {
        return serde_json::from_value(body)
            .map(Envelope::Data)
            .map_err(decode_err);
    }
    if let Some(body) = obj.remove("notify") {
        let entries: Vec<Value> = serde_json::from_value(body).map_err(decode_err)?;
        return Ok(Envelope::Notify(entries.into_iter().map(notify_entry).collect()));
    }

    Ok(Envelope::Unclassified(raw.to_owned()))
}

fn notify_entry(value: Value) -> NotifyEntry {
    let millis = match value.get("heartbeat") {
        Some(Value::String(s)) => s.parse().ok(),
        Some(Value::Number(n)) => n.as_i64(),
        _ => None,
    };
    match millis {
        Some(millis) => NotifyEntry::Heartbeat(Heartbeat { millis }),
        None => NotifyEntry::Other(value),
    }
}

/// Rewrite the integer keys of one content item into field names.
///
/// Keys that are not plain decimal integers, or that the service's schema
/// does not cover, are kept verbatim. Unknown services pass through unchanged.
pub fn relabel(service: &str, item: Map<String, Value>) -> Map<String, Value> {
    let Some(schema) = fields::schema_for(service) else {
        return item;
    };

    item.into_iter()
        .map(|(key, value)| {
            let name = parse_index(&key).and_then(|i| schema.get(i));
            match name {
                Some(name) => ((*name).to_owned(), value),
                None => (key, value),
            }
        })
        .collect()
}

fn parse_index(key: &str) -> Option<usize> {
    if key.is_empty() || !key.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    key.parse().ok()
}

fn de_request_id<'de, D>(deserializer: D) -> std::result::Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => s.trim().parse().ok(),
        Some(Value::Number(n)) => n.as_u64(),
        _ => None,
    })
}

// ---------------------------------------------------------------------------
// Pluggable decoder
// ---------------------------------------------------------------------------

/// Turns raw frames into envelopes and data items into named fields.
///
/// [`SchemaDecoder`] is the default; swap it in through
/// [`StreamerClientBuilder::decoder`](crate::ws::client::StreamerClientBuilder::decoder).
pub trait FrameDecoder: Send + Sync {
    fn decode(&self, raw: &str) -> Result<Envelope>;

    fn relabel(&self, service: &str, item: Map<String, Value>) -> Map<String, Value>;

    /// Relabel every item of a data entry.
    fn to_message(&self, entry: DataEntry) -> StreamMessage {
        let content = entry
            .content
            .into_iter()
            .map(|item| self.relabel(&entry.service, item))
            .collect();
        StreamMessage {
            service: entry.service,
            command: entry.command,
            timestamp: entry.timestamp,
            content,
        }
    }
}

/// Decoder backed by the static field tables.
#[derive(Debug, Clone, Copy, Default)]
pub struct SchemaDecoder;

impl FrameDecoder for SchemaDecoder {
    fn decode(&self, raw: &str) -> Result<Envelope> {
        decode(raw)
    }

    fn relabel(&self, service: &str, item: Map<String, Value>) -> Map<String, Value> {
        relabel(service, item)
    }
}

// ---------------------------------------------------------------------------
// Outbound requests
// ---------------------------------------------------------------------------

/// Session identity stamped on every outbound command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestIdentity {
    pub customer_id: String,
    pub correl_id: String,
}

impl From<&StreamerInfo> for RequestIdentity {
    fn from(info: &StreamerInfo) -> Self {
        Self {
            customer_id: info.schwab_client_customer_id.clone(),
            correl_id: info.schwab_client_correl_id.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
#[allow(non_snake_case)]
struct StreamRequest<'a> {
    service: &'a str,
    command: &'a str,
    requestid: String,
    SchwabClientCustomerId: &'a str,
    SchwabClientCorrelId: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    parameters: Option<&'a Value>,
}

/// `parameters` of SUBS / UNSUBS / ADD / VIEW.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SubscriptionParameters {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keys: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<String>,
}

/// `parameters` of `ADMIN/LOGIN`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[allow(non_snake_case)]
pub struct LoginParameters {
    pub Authorization: String,
    pub SchwabClientChannel: String,
    pub SchwabClientFunctionId: String,
}

/// Serialize one command frame.
pub fn encode_request(
    identity: &RequestIdentity,
    request_id: u64,
    service: &str,
    command: Command,
    parameters: Option<&Value>,
) -> Result<String> {
    let req = StreamRequest {
        service,
        command: command.as_str(),
        requestid: request_id.to_string(),
        SchwabClientCustomerId: &identity.customer_id,
        SchwabClientCorrelId: &identity.correl_id,
        parameters,
    };
    Ok(serde_json::to_string(&req)?)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn object(v: Value) -> Map<String, Value> {
        match v {
            Value::Object(m) => m,
            other => panic!("not an object: {other}"),
        }
    }

    #[test]
    fn decode_response() {
        let raw = r#"{"response":[{"service":"ADMIN","command":"LOGIN","requestid":"0",
            "SchwabClientCorrelId":"abc","timestamp":1700000000000,
            "content":{"code":0,"msg":"server=s0;status=PN"}}]}"#;
        let Envelope::Response(entries) = decode(raw).unwrap() else {
            panic!("expected response");
        };
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].request_id, Some(0));
        assert_eq!(entries[0].code(), Some(0));
        assert_eq!(entries[0].message(), "server=s0;status=PN");
    }

    #[test]
    fn numeric_request_id_is_accepted() {
        let raw = r#"{"response":[{"service":"LEVELONE_EQUITIES","command":"SUBS",
            "requestid":7,"content":{"code":26,"msg":"ok"}}]}"#;
        let Envelope::Response(entries) = decode(raw).unwrap() else {
            panic!("expected response");
        };
        assert_eq!(entries[0].request_id, Some(7));
    }

    #[test]
    fn decode_data_keeps_item_order() {
        let raw = r#"{"data":[{"service":"LEVELONE_EQUITIES","timestamp":1700000000123,
            "command":"SUBS",
            "content":[{"key":"AAPL","1":150.0},{"key":"MSFT","1":410.5}]}]}"#;
        let Envelope::Data(entries) = decode(raw).unwrap() else {
            panic!("expected data");
        };
        let keys: Vec<_> = entries[0].content.iter().map(|c| c["key"].clone()).collect();
        assert_eq!(keys, vec![json!("AAPL"), json!("MSFT")]);
        assert_eq!(entries[0].timestamp, 1_700_000_000_123);
    }

    #[test]
    fn decode_notify() {
        let raw = r#"{"notify":[{"heartbeat":"1700000000000"},
            {"service":"ADMIN","content":{"code":30,"msg":"Stop streaming"}}]}"#;
        let Envelope::Notify(entries) = decode(raw).unwrap() else {
            panic!("expected notify");
        };
        assert_eq!(
            entries[0],
            NotifyEntry::Heartbeat(Heartbeat {
                millis: 1_700_000_000_000
            })
        );
        assert!(matches!(entries[1], NotifyEntry::Other(_)));
        let NotifyEntry::Heartbeat(hb) = &entries[0] else { unreachable!() };
        assert_eq!(hb.time().unwrap().timestamp(), 1_700_000_000);
    }

    #[test]
    fn malformed_json_is_a_decode_error() {
        let err = decode("{not json").unwrap_err();
        assert!(matches!(err, SchwabError::Decode { ref raw, .. } if raw == "{not json"));
    }

    #[test]
    fn wrong_envelope_shape_is_a_decode_error() {
        assert!(matches!(
            decode(r#"{"data":"nope"}"#),
            Err(SchwabError::Decode { .. })
        ));
    }

    #[test]
    fn valid_json_without_envelope_is_unclassified() {
        assert_eq!(
            decode(r#"{"snapshot":[]}"#).unwrap(),
            Envelope::Unclassified(r#"{"snapshot":[]}"#.into())
        );
        assert_eq!(decode("[1,2]").unwrap(), Envelope::Unclassified("[1,2]".into()));
    }

    #[test]
    fn relabel_level_one_equities() {
        let item = object(json!({"0": "AAPL", "1": 150.25}));
        assert_eq!(
            relabel("LEVELONE_EQUITIES", item),
            object(json!({"SYMBOL": "AAPL", "BID_PRICE": 150.25}))
        );
    }

    #[test]
    fn relabel_passes_through_unknown_keys() {
        let item = object(json!({"key": "AAPL", "delayed": false, "999": 1, "+1": 2, "2": 3.5}));
        assert_eq!(
            relabel("LEVELONE_EQUITIES", item),
            object(json!({"key": "AAPL", "delayed": false, "999": 1, "+1": 2, "ASK_PRICE": 3.5}))
        );
    }

    #[test]
    fn relabel_unknown_service_is_identity() {
        let item = object(json!({"0": "x", "1": 2}));
        assert_eq!(relabel("SOMETHING_NEW", item.clone()), item);
    }

    #[test]
    fn to_message_relabels_every_item() {
        let entry = DataEntry {
            service: "CHART_EQUITY".into(),
            timestamp: 1,
            command: "SUBS".into(),
            content: vec![
                object(json!({"0": "AAPL", "4": 1.0})),
                object(json!({"0": "MSFT", "4": 2.0})),
            ],
        };
        let msg = SchemaDecoder.to_message(entry);
        assert_eq!(msg.content[0]["CLOSE_PRICE"], json!(1.0));
        assert_eq!(msg.content[1]["SYMBOL"], json!("MSFT"));
        assert_eq!(msg.service_kind(), Some(Service::CHART_EQUITY));
    }

    #[test]
    fn encode_subscription_request() {
        let identity = RequestIdentity {
            customer_id: "cust".into(),
            correl_id: "corr".into(),
        };
        let params = serde_json::to_value(SubscriptionParameters {
            keys: Some("AAPL,MSFT".into()),
            fields: Some("0,1,2".into()),
        })
        .unwrap();
        let frame =
            encode_request(&identity, 4, "LEVELONE_EQUITIES", Command::SUBS, Some(&params))
                .unwrap();
        let value: Value = serde_json::from_str(&frame).unwrap();
        assert_eq!(
            value,
            json!({
                "service": "LEVELONE_EQUITIES",
                "command": "SUBS",
                "requestid": "4",
                "SchwabClientCustomerId": "cust",
                "SchwabClientCorrelId": "corr",
                "parameters": {"keys": "AAPL,MSFT", "fields": "0,1,2"}
            })
        );
    }

    #[test]
    fn encode_omits_absent_parameters() {
        let identity = RequestIdentity {
            customer_id: "c".into(),
            correl_id: "r".into(),
        };
        let frame = encode_request(&identity, 0, "ADMIN", Command::LOGOUT, None).unwrap();
        let value: Value = serde_json::from_str(&frame).unwrap();
        assert!(value.get("parameters").is_none());
    }
}
