//! `weixinpay` - command-line front end for the merchant SDK
//!
//! Loads a merchant configuration from TOML and runs one operation, printing the
//! result as pretty JSON on stdout. Logs go to stderr.
//!
//! # Exit status
//!
//! - `0`: the operation succeeded
//! - `1`: local, network or codec error
//! - `2`: the provider rejected the request

#![allow(
    clippy::multiple_crate_versions,
    reason = "transitive dependencies from reqwest and quick-xml"
)]

mod observability;

use std::{path::PathBuf, process::ExitCode};

use clap::{Parser, Subcommand, ValueEnum};
use tracing::{error, info};
use weixinpay::{
    api::{ApiOutcome, OrderQuery, PayClient, Refund, RefundQuery, TradeType, UnifiedOrder},
    config::MerchantConfig,
    notify::RefundNotifyDecryptor,
    sign::{SignType, sign},
    value::{ParamMap, Value, XmlMap},
};

use crate::observability::{LogFormat, init_observability};

#[derive(Debug, Parser)]
#[command(name = "weixinpay", version, about = "WeChat Pay v2 merchant API client")]
struct Cli {
    /// Merchant configuration file.
    #[arg(long, short, default_value = "weixinpay.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Sign a set of fields with the merchant key.
    Sign {
        /// Field as `name=value`; repeatable.
        #[arg(long = "param", short, value_parser = parse_param)]
        params: Vec<(String, String)>,

        /// Algorithm, overriding the configured one (`MD5` or `HMAC-SHA256`).
        #[arg(long)]
        sign_type: Option<String>,
    },

    /// Stage a payment.
    UnifiedOrder {
        #[arg(long)]
        body: String,
        #[arg(long)]
        out_trade_no: String,
        /// Amount in fen.
        #[arg(long)]
        total_fee: i64,
        #[arg(long)]
        spbill_create_ip: String,
        #[arg(long)]
        notify_url: String,
        #[arg(long, value_enum, default_value_t = TradeTypeArg::Jsapi)]
        trade_type: TradeTypeArg,
        #[arg(long)]
        openid: Option<String>,
        #[arg(long)]
        product_id: Option<String>,
    },

    /// Look up an order.
    OrderQuery {
        #[arg(long)]
        transaction_id: Option<String>,
        #[arg(long)]
        out_trade_no: Option<String>,
    },

    /// Apply for a refund (uses the configured client certificate).
    Refund {
        #[arg(long)]
        out_refund_no: String,
        /// Order amount in fen.
        #[arg(long)]
        total_fee: i64,
        /// Refund amount in fen.
        #[arg(long)]
        refund_fee: i64,
        #[arg(long)]
        transaction_id: Option<String>,
        #[arg(long)]
        out_trade_no: Option<String>,
        #[arg(long)]
        refund_desc: Option<String>,
    },

    /// Look up refunds.
    RefundQuery {
        #[arg(long)]
        refund_id: Option<String>,
        #[arg(long)]
        out_refund_no: Option<String>,
        #[arg(long)]
        transaction_id: Option<String>,
        #[arg(long)]
        out_trade_no: Option<String>,
        #[arg(long)]
        offset: Option<u32>,
    },

    /// Decrypt the `req_info` of a refund notification.
    DecryptRefund {
        /// Base64 `req_info` value.
        req_info: String,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum TradeTypeArg {
    Jsapi,
    Native,
    App,
    Mweb,
}

impl From<TradeTypeArg> for TradeType {
    fn from(arg: TradeTypeArg) -> Self {
        match arg {
            TradeTypeArg::Jsapi => Self::Jsapi,
            TradeTypeArg::Native => Self::Native,
            TradeTypeArg::App => Self::App,
            TradeTypeArg::Mweb => Self::Mweb,
        }
    }
}

fn parse_param(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(name, value)| (name.to_owned(), value.to_owned()))
        .filter(|(name, _)| !name.is_empty())
        .ok_or_else(|| format!("expected name=value, got '{raw}'"))
}

/// What a command produced.
enum Output {
    Done(serde_json::Value),
    Rejected(String, serde_json::Value),
}

impl<T> From<ApiOutcome<T>> for Output
where
    T: Into<serde_json::Value>,
{
    fn from(outcome: ApiOutcome<T>) -> Self {
        match outcome {
            ApiOutcome::Accepted(value) => Self::Done(value.into()),
            ApiOutcome::Rejected(rejection) => {
                Self::Rejected(rejection.to_string(), map_to_json(&rejection.response))
            }
        }
    }
}

/// Reply fields as a JSON object.
struct Fields(XmlMap);

impl From<Fields> for serde_json::Value {
    fn from(fields: Fields) -> Self {
        map_to_json(&fields.0)
    }
}

fn map_to_json(map: &XmlMap) -> serde_json::Value {
    serde_json::Value::Object(map.iter().map(|(name, value)| (name.clone(), value.to_json())).collect())
}

async fn run(cli: Cli) -> weixinpay::Result<Output> {
    let config = MerchantConfig::from_file(&cli.config)?;
    info!(config = %cli.config.display(), mch_id = %config.mch_id, "loaded merchant configuration");

    match cli.command {
        Command::Sign { params, sign_type } => {
            let sign_type = match sign_type {
                Some(name) => name.parse::<SignType>()?,
                None => config.sign_type,
            };
            let params: ParamMap =
                params.into_iter().map(|(name, value)| (name, Value::from(value))).collect();
            let signature = sign(&params, config.key.expose(), sign_type)?;
            Ok(Output::Done(serde_json::json!({
                "sign": signature,
                "sign_type": sign_type.as_str(),
            })))
        }
        Command::DecryptRefund { req_info } => {
            let fields = RefundNotifyDecryptor::new(&config.key)?.decrypt(&req_info)?;
            Ok(Output::Done(map_to_json(&fields)))
        }
        Command::UnifiedOrder {
            body,
            out_trade_no,
            total_fee,
            spbill_create_ip,
            notify_url,
            trade_type,
            openid,
            product_id,
        } => {
            let client = PayClient::new(config)?;
            let mut order = UnifiedOrder::new(body, out_trade_no, total_fee, spbill_create_ip, notify_url)
                .trade_type(trade_type.into());
            if let Some(openid) = openid {
                order = order.openid(openid);
            }
            if let Some(product_id) = product_id {
                order = order.product_id(product_id);
            }
            let outcome = order.send(&client).await?.map(|prepay| {
                serde_json::json!({
                    "prepay_id": prepay.prepay_id,
                    "code_url": prepay.code_url,
                    "mweb_url": prepay.mweb_url,
                    "pay_params": prepay.pay_params,
                })
            });
            Ok(outcome.into())
        }
        Command::OrderQuery { transaction_id, out_trade_no } => {
            let client = PayClient::new(config)?;
            let mut query = OrderQuery::new();
            if let Some(transaction_id) = transaction_id {
                query = query.transaction_id(transaction_id);
            }
            if let Some(out_trade_no) = out_trade_no {
                query = query.out_trade_no(out_trade_no);
            }
            Ok(query.send(&client).await?.map(Fields).into())
        }
        Command::Refund {
            out_refund_no,
            total_fee,
            refund_fee,
            transaction_id,
            out_trade_no,
            refund_desc,
        } => {
            let client = PayClient::new(config)?;
            let mut refund = Refund::new(out_refund_no, total_fee, refund_fee);
            if let Some(transaction_id) = transaction_id {
                refund = refund.transaction_id(transaction_id);
            }
            if let Some(out_trade_no) = out_trade_no {
                refund = refund.out_trade_no(out_trade_no);
            }
            if let Some(refund_desc) = refund_desc {
                refund = refund.refund_desc(refund_desc);
            }
            Ok(refund.send(&client).await?.map(Fields).into())
        }
        Command::RefundQuery { refund_id, out_refund_no, transaction_id, out_trade_no, offset } => {
            let client = PayClient::new(config)?;
            let mut query = RefundQuery::new();
            if let Some(refund_id) = refund_id {
                query = query.refund_id(refund_id);
            }
            if let Some(out_refund_no) = out_refund_no {
                query = query.out_refund_no(out_refund_no);
            }
            if let Some(transaction_id) = transaction_id {
                query = query.transaction_id(transaction_id);
            }
            if let Some(out_trade_no) = out_trade_no {
                query = query.out_trade_no(out_trade_no);
            }
            if let Some(offset) = offset {
                query = query.offset(offset);
            }
            Ok(query.send(&client).await?.map(Fields).into())
        }
    }
}

fn print_json(value: &serde_json::Value) {
    match serde_json::to_string_pretty(value) {
        Ok(text) => println!("{text}"),
        Err(e) => error!(error = %e, "cannot render output"),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    init_observability(LogFormat::from_env());

    match run(Cli::parse()).await {
        Ok(Output::Done(value)) => {
            print_json(&value);
            ExitCode::SUCCESS
        }
        Ok(Output::Rejected(reason, reply)) => {
            error!(%reason, "request rejected");
            print_json(&reply);
            ExitCode::from(2)
        }
        Err(e) => {
            error!(error = %e, "command failed");
            ExitCode::FAILURE
        }
    }
}
