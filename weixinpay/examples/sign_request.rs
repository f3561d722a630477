//! Signing and encoding a request document by hand.
//!
//! Shows the canonical signing string at work and the XML that would be posted.
//!
//! # Running this example
//!
//! ```bash
//! cargo run --example sign_request
//! ```

#![allow(
    clippy::print_stdout,
    reason = "examples are allowed to use println"
)]

use weixinpay::{
    sign::{SIGN_FIELD, SignType, Signer, nonce_str},
    value::{ParamMap, Value},
    xml,
};

fn main() -> weixinpay::Result<()> {
    let signer = Signer::new("192006250b4c09247ec02edce69f6a2d", SignType::HmacSha256);

    let mut params = ParamMap::new();
    params.insert("appid".to_owned(), Value::from("wx2421b1c4370ec43b"));
    params.insert("mch_id".to_owned(), Value::from("10000100"));
    params.insert("out_trade_no".to_owned(), Value::from("1415757673"));
    params.insert("sign_type".to_owned(), Value::from(SignType::HmacSha256.as_str()));
    params.insert("nonce_str".to_owned(), Value::from(nonce_str()));
    // Blank fields are left out of both the signature and the document
    params.insert("device_info".to_owned(), Value::from(""));

    let signature = signer.sign(&params)?;
    println!("sign: {signature}");

    params.insert(SIGN_FIELD.to_owned(), Value::from(signature));
    let document = xml::encode(xml::ROOT, &params);
    println!("{document}");

    // A reply signed with the same key verifies
    let reply = xml::decode(&document)?;
    println!("verified: {}", signer.verify(&reply)?);
    Ok(())
}
