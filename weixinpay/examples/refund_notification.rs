//! Handling a refund result notification.
//!
//! Reads the notification body posted by the provider from stdin, decrypts
//! `req_info` and prints the acknowledgement to send back.
//!
//! # Running this example
//!
//! ```bash
//! export WEIXINPAY_KEY=<merchant API key>
//! cargo run --example refund_notification < notification.xml
//! ```

#![allow(
    clippy::print_stdout,
    clippy::print_stderr,
    reason = "examples are allowed to use println"
)]

use std::{env, io::Read};

use weixinpay::{
    PayError,
    notify::{RefundNotification, acknowledge},
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let key = env::var("WEIXINPAY_KEY").map_err(|_| "WEIXINPAY_KEY environment variable not set")?;

    let mut body = String::new();
    std::io::stdin().read_to_string(&mut body)?;

    match RefundNotification::parse(&body, key) {
        Ok(notification) => {
            println!("out_refund_no: {:?}", notification.out_refund_no());
            println!("refund_status: {:?}", notification.refund_status());
            println!("refund_fee:    {:?}", notification.field("refund_fee"));
            println!("{}", acknowledge());
        }
        Err(PayError::DecryptionFailed(msg)) => {
            // Wrong key or tampered payload; do not acknowledge
            eprintln!("cannot decrypt notification: {msg}");
        }
        Err(e) => return Err(e.into()),
    }
    Ok(())
}
