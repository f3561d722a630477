//! Unified order: stage a payment and obtain a prepay id.

use std::{fmt, time::Duration};

use serde::Serialize;
use tracing::instrument;

use super::{
    client::{Call, PayClient, insert_text, reject},
    outcome::{ApiOutcome, RejectReason},
};
use crate::{
    error::{PayError, Result},
    sign::{Signer, nonce_str},
    transport::Transport,
    value::{ParamMap, Value, XmlMap, text_field},
};

const PATH: &str = "/pay/unifiedorder";

const REQUIRED: &[&str] =
    &["body", "out_trade_no", "total_fee", "spbill_create_ip", "notify_url", "trade_type"];

/// Payment channel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum TradeType {
    /// In-app browser / mini program payment. Requires `openid`.
    #[default]
    Jsapi,
    /// QR code payment. Requires `product_id`.
    Native,
    /// Native mobile app payment.
    App,
    /// Mobile web (H5) payment.
    Mweb,
}

impl TradeType {
    /// Returns the wire name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Jsapi => "JSAPI",
            Self::Native => "NATIVE",
            Self::App => "APP",
            Self::Mweb => "MWEB",
        }
    }
}

impl fmt::Display for TradeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unified order request.
///
/// Setters consume and return the request, so a configured value can be cloned
/// and reused for several orders.
///
/// # Examples
///
/// ```rust,no_run
/// use weixinpay::{
///     api::{ApiOutcome, PayClient, TradeType, UnifiedOrder},
///     config::MerchantConfig,
/// };
///
/// # async fn example() -> weixinpay::error::Result<()> {
/// let client = PayClient::new(MerchantConfig::new("wx123", "10000100", "secretkey"))?;
///
/// let order = UnifiedOrder::new("Tencent-Game", "20150806125346", 88, "123.12.12.123", "https://example.com/notify")
///     .trade_type(TradeType::Jsapi)
///     .openid("oUpF8uMuAJO_M2pxb1Q9zNjWeS6o");
///
/// if let ApiOutcome::Accepted(prepay) = order.send(&client).await? {
///     println!("{}", serde_json::to_string(&prepay.pay_params).unwrap_or_default());
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnifiedOrder {
    body: String,
    out_trade_no: String,
    total_fee: i64,
    spbill_create_ip: String,
    notify_url: String,
    trade_type: TradeType,
    fee_type: String,
    openid: Option<String>,
    product_id: Option<String>,
    device_info: Option<String>,
    detail: Option<String>,
    attach: Option<String>,
    goods_tag: Option<String>,
    limit_pay: Option<String>,
    receipt: Option<String>,
    time_start: Option<String>,
    time_expire: Option<String>,
    scene_info: Option<Value>,
    timeout: Option<Duration>,
}

impl UnifiedOrder {
    /// Creates a JSAPI order in CNY.
    ///
    /// `total_fee` is in fen (1/100 CNY).
    #[must_use]
    pub fn new(
        body: impl Into<String>,
        out_trade_no: impl Into<String>,
        total_fee: i64,
        spbill_create_ip: impl Into<String>,
        notify_url: impl Into<String>,
    ) -> Self {
        Self {
            body: body.into(),
            out_trade_no: out_trade_no.into(),
            total_fee,
            spbill_create_ip: spbill_create_ip.into(),
            notify_url: notify_url.into(),
            trade_type: TradeType::default(),
            fee_type: "CNY".to_owned(),
            openid: None,
            product_id: None,
            device_info: None,
            detail: None,
            attach: None,
            goods_tag: None,
            limit_pay: None,
            receipt: None,
            time_start: None,
            time_expire: None,
            scene_info: None,
            timeout: None,
        }
    }

    /// Sets the payment channel.
    #[must_use]
    pub fn trade_type(mut self, trade_type: TradeType) -> Self {
        self.trade_type = trade_type;
        self
    }

    /// Payer's openid (required for [`TradeType::Jsapi`]).
    #[must_use]
    pub fn openid(mut self, openid: impl Into<String>) -> Self {
        self.openid = Some(openid.into());
        self
    }

    /// Product encoded in the QR code (required for [`TradeType::Native`]).
    #[must_use]
    pub fn product_id(mut self, product_id: impl Into<String>) -> Self {
        self.product_id = Some(product_id.into());
        self
    }

    /// Terminal or store id; `WEB` for web payments.
    #[must_use]
    pub fn device_info(mut self, device_info: impl Into<String>) -> Self {
        self.device_info = Some(device_info.into());
        self
    }

    /// Detailed goods description.
    #[must_use]
    pub fn detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// Merchant data echoed back in queries and notifications.
    #[must_use]
    pub fn attach(mut self, attach: impl Into<String>) -> Self {
        self.attach = Some(attach.into());
        self
    }

    /// ISO 4217 currency, `CNY` by default.
    #[must_use]
    pub fn fee_type(mut self, fee_type: impl Into<String>) -> Self {
        self.fee_type = fee_type.into();
        self
    }

    /// Coupon / discount tag.
    #[must_use]
    pub fn goods_tag(mut self, goods_tag: impl Into<String>) -> Self {
        self.goods_tag = Some(goods_tag.into());
        self
    }

    /// Disallows credit cards.
    #[must_use]
    pub fn no_credit(mut self) -> Self {
        self.limit_pay = Some("no_credit".to_owned());
        self
    }

    /// Allows credit cards (default).
    #[must_use]
    pub fn use_credit(mut self) -> Self {
        self.limit_pay = None;
        self
    }

    /// Shows the electronic invoice entry after payment.
    #[must_use]
    pub fn receipt(mut self) -> Self {
        self.receipt = Some("Y".to_owned());
        self
    }

    /// Hides the invoice entry (default).
    #[must_use]
    pub fn no_receipt(mut self) -> Self {
        self.receipt = None;
        self
    }

    /// Order start time, `yyyyMMddHHmmss`.
    #[must_use]
    pub fn time_start(mut self, time_start: impl Into<String>) -> Self {
        self.time_start = Some(time_start.into());
        self
    }

    /// Order expiry time, `yyyyMMddHHmmss`.
    #[must_use]
    pub fn time_expire(mut self, time_expire: impl Into<String>) -> Self {
        self.time_expire = Some(time_expire.into());
        self
    }

    /// Store information, sent as JSON (`{"store_info": {...}}`).
    #[must_use]
    pub fn scene_info(mut self, scene_info: impl Into<Value>) -> Self {
        self.scene_info = Some(scene_info.into());
        self
    }

    /// Deadline for this call.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Checks trade-type specific requirements.
    fn validate(&self) -> Result<()> {
        let blank = |v: Option<&str>| v.is_none_or(|s| s.trim().is_empty());

        match self.trade_type {
            TradeType::Jsapi if blank(self.openid.as_deref()) => {
                Err(PayError::InvalidRequest("trade_type=JSAPI requires openid".to_owned()))
            }
            TradeType::Native if blank(self.product_id.as_deref()) => {
                Err(PayError::InvalidRequest("trade_type=NATIVE requires product_id".to_owned()))
            }
            _ => Ok(()),
        }
    }

    fn params(&self) -> ParamMap {
        let mut params = ParamMap::new();
        insert_text(&mut params, "body", Some(self.body.as_str()));
        insert_text(&mut params, "out_trade_no", Some(self.out_trade_no.as_str()));
        params.insert("total_fee".to_owned(), Value::from(self.total_fee));
        insert_text(&mut params, "spbill_create_ip", Some(self.spbill_create_ip.as_str()));
        insert_text(&mut params, "notify_url", Some(self.notify_url.as_str()));
        params.insert("trade_type".to_owned(), Value::from(self.trade_type.as_str()));
        insert_text(&mut params, "fee_type", Some(self.fee_type.as_str()));
        insert_text(&mut params, "openid", self.openid.as_deref());
        insert_text(&mut params, "product_id", self.product_id.as_deref());
        insert_text(&mut params, "device_info", self.device_info.as_deref());
        insert_text(&mut params, "detail", self.detail.as_deref());
        insert_text(&mut params, "attach", self.attach.as_deref());
        insert_text(&mut params, "goods_tag", self.goods_tag.as_deref());
        insert_text(&mut params, "limit_pay", self.limit_pay.as_deref());
        insert_text(&mut params, "receipt", self.receipt.as_deref());
        insert_text(&mut params, "time_start", self.time_start.as_deref());
        insert_text(&mut params, "time_expire", self.time_expire.as_deref());
        if let Some(scene_info) = self.scene_info.as_ref().filter(|v| !v.is_blank()) {
            params.insert("scene_info".to_owned(), scene_info.clone());
        }
        params
    }

    /// Places the order.
    ///
    /// On success the reply's `prepay_id` is re-signed into [`JsapiPayParams`]
    /// for the front end.
    ///
    /// # Errors
    ///
    /// - [`PayError::InvalidRequest`] if the trade type's extra field is missing
    ///   or a required field is empty; nothing is sent in that case.
    /// - Transport and codec errors from the exchange.
    pub async fn send<T: Transport>(self, client: &PayClient<T>) -> Result<ApiOutcome<PrepayResult>> {
        client.scoped(self.execute(client)).await
    }

    #[instrument(
        name = "unified_order",
        skip_all,
        fields(out_trade_no = %self.out_trade_no, trade_type = %self.trade_type, total_fee = self.total_fee)
    )]
    async fn execute<T: Transport>(self, client: &PayClient<T>) -> Result<ApiOutcome<PrepayResult>> {
        self.validate()?;

        let mut call = Call::new("unified_order", PATH, self.params());
        call.required = REQUIRED;
        call.timeout = self.timeout;

        let reply = match client.execute(call).await? {
            ApiOutcome::Accepted(reply) => reply,
            ApiOutcome::Rejected(rejection) => return Ok(ApiOutcome::Rejected(rejection)),
        };

        let Some(prepay_id) = text_field(&reply, "prepay_id").map(str::to_owned) else {
            return Ok(reject("unified_order", RejectReason::result_code(&reply), reply));
        };

        let app_id = text_field(&reply, "appid").unwrap_or(&client.config().appid).to_owned();
        let pay_params = JsapiPayParams::new(
            client.signer(),
            app_id,
            &prepay_id,
            chrono::Utc::now().timestamp(),
            nonce_str(),
        )?;
        let code_url = text_field(&reply, "code_url").map(str::to_owned);
        let mweb_url = text_field(&reply, "mweb_url").map(str::to_owned);

        Ok(ApiOutcome::Accepted(PrepayResult { prepay_id, code_url, mweb_url, pay_params, response: reply }))
    }
}

/// Accepted unified order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrepayResult {
    /// Provider-issued prepay id, valid for two hours.
    pub prepay_id: String,
    /// QR code content (NATIVE orders).
    pub code_url: Option<String>,
    /// Payment page URL (MWEB orders).
    pub mweb_url: Option<String>,
    /// Signed payload for the JSAPI `requestPayment` call.
    pub pay_params: JsapiPayParams,
    /// Decoded reply fields.
    pub response: XmlMap,
}

/// Front-end payment parameters, signed independently of the order request.
///
/// Serializes with the field names the JSAPI expects:
///
/// ```json
/// {"appId":"wx123","timeStamp":1414561699,"nonceStr":"...","package":"prepay_id=...","signType":"MD5","paySign":"..."}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JsapiPayParams {
    /// Application id.
    pub app_id: String,
    /// Unix timestamp in seconds.
    pub time_stamp: i64,
    /// Random string.
    pub nonce_str: String,
    /// `prepay_id=<prepay id>`.
    pub package: String,
    /// `MD5` or `HMAC-SHA256`.
    pub sign_type: String,
    /// Signature over the five fields above.
    pub pay_sign: String,
}

impl JsapiPayParams {
    /// Builds and signs the payload for `prepay_id`.
    ///
    /// # Errors
    ///
    /// Returns [`PayError::InvalidConfiguration`] if the HMAC key is rejected.
    pub fn new(
        signer: &Signer,
        app_id: impl Into<String>,
        prepay_id: &str,
        time_stamp: i64,
        nonce_str: impl Into<String>,
    ) -> Result<Self> {
        let mut params = Self {
            app_id: app_id.into(),
            time_stamp,
            nonce_str: nonce_str.into(),
            package: format!("prepay_id={prepay_id}"),
            sign_type: signer.sign_type().as_str().to_owned(),
            pay_sign: String::new(),
        };
        params.pay_sign = signer.sign(&params.signed_fields())?;
        Ok(params)
    }

    /// Fields covered by `paySign`.
    #[must_use]
    pub fn signed_fields(&self) -> ParamMap {
        let mut fields = ParamMap::new();
        fields.insert("appId".to_owned(), Value::from(self.app_id.as_str()));
        fields.insert("timeStamp".to_owned(), Value::from(self.time_stamp));
        fields.insert("nonceStr".to_owned(), Value::from(self.nonce_str.as_str()));
        fields.insert("package".to_owned(), Value::from(self.package.as_str()));
        fields.insert("signType".to_owned(), Value::from(self.sign_type.as_str()));
        fields
    }
}
