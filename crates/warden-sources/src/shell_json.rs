//! Decoding the mongo shell's `printjson` output.
//!
//! The shell prints extended JSON: values wrapped in constructors such as
//! `ISODate("...")` or `Timestamp(1353453412, 1)`. None of the wrapped
//! values matter to reconciliation, so the wrappers are stripped to their
//! first argument before handing the text to `serde_json`.

use crate::error::{Error, Result};
use regex::Regex;
use serde::de::DeserializeOwned;

/// Patterns for the shell's value constructors.
struct Constructors {
    /// `Timestamp({ t: 1700000000, i: 3 })`, printed by newer shells
    timestamp_doc: Regex,
    /// `Timestamp(1353453412000, 1)`
    timestamp_pair: Regex,
    /// `BinData(0, "AAAA=")`, reduced to its base64 payload
    bin_data: Regex,
    wrapper: Regex,
}

impl Constructors {
    fn new() -> Result<Self> {
        Ok(Self {
            timestamp_doc: Regex::new(r"Timestamp\(\s*\{\s*t\s*:\s*(\d+)\s*,\s*i\s*:\s*\d+\s*\}\s*\)")?,
            timestamp_pair: Regex::new(r"Timestamp\((.*?)\s*,\s*(.*?)\)")?,
            bin_data: Regex::new(r#"BinData\(\s*\d+\s*,\s*(".*?")\s*\)"#)?,
            wrapper: Regex::new(
                r"(?:ISODate|ObjectId|NumberLong|NumberInt|NumberDecimal)\((.*?)\)",
            )?,
        })
    }

    fn strip(&self, output: &str) -> String {
        let cleaned = self.timestamp_doc.replace_all(output, "${1}");
        let cleaned = self.timestamp_pair.replace_all(&cleaned, "${1}");
        let cleaned = self.bin_data.replace_all(&cleaned, "${1}");
        self.wrapper.replace_all(&cleaned, "${1}").into_owned()
    }
}

/// Strip shell constructors so the text is plain JSON.
pub fn clean(output: &str) -> Result<String> {
    Ok(Constructors::new()?.strip(output))
}

/// Decode the document printed by `printjson(<what>)`.
///
/// Anything the shell printed around the document (version banners,
/// warnings) is ignored.
pub fn decode<T: DeserializeOwned>(what: &str, output: &str) -> Result<T> {
    let start = output.find('{');
    let end = output.rfind('}');
    let body = match (start, end) {
        (Some(start), Some(end)) if start < end => &output[start..=end],
        _ => return Err(Error::malformed(what, format!("no JSON document in {:?}", output.trim()))),
    };
    serde_json::from_str(&clean(body)?).map_err(|source| Error::Json {
        what: what.to_string(),
        source,
    })
}
