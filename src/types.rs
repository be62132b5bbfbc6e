use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

use crate::util::{deserialize_i64_str, serialize_i64_str};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub enum CandleInterval {
    #[serde(rename = "CANDLE_INTERVAL_UNSPECIFIED")]
    Unspecified,
    #[serde(rename = "CANDLE_INTERVAL_5_SEC")]
    Sec5,
    #[serde(rename = "CANDLE_INTERVAL_10_SEC")]
    Sec10,
    #[serde(rename = "CANDLE_INTERVAL_30_SEC")]
    Sec30,
    #[serde(rename = "CANDLE_INTERVAL_1_MIN")]
    Min1,
    #[serde(rename = "CANDLE_INTERVAL_2_MIN")]
    Min2,
    #[serde(rename = "CANDLE_INTERVAL_3_MIN")]
    Min3,
    #[serde(rename = "CANDLE_INTERVAL_5_MIN")]
    Min5,
    #[serde(rename = "CANDLE_INTERVAL_10_MIN")]
    Min10,
    #[serde(rename = "CANDLE_INTERVAL_15_MIN")]
    Min15,
    #[serde(rename = "CANDLE_INTERVAL_30_MIN")]
    Min30,
    #[serde(rename = "CANDLE_INTERVAL_HOUR")]
    Hour,
    #[serde(rename = "CANDLE_INTERVAL_2_HOUR")]
    Hour2,
    #[serde(rename = "CANDLE_INTERVAL_4_HOUR")]
    Hour4,
    #[serde(rename = "CANDLE_INTERVAL_DAY")]
    Day,
    #[serde(rename = "CANDLE_INTERVAL_WEEK")]
    Week,
    #[serde(rename = "CANDLE_INTERVAL_MONTH")]
    Month
}

impl CandleInterval {
    pub const ALL: [CandleInterval; 17] = [
        CandleInterval::Unspecified,
        CandleInterval::Sec5,
        CandleInterval::Sec10,
        CandleInterval::Sec30,
        CandleInterval::Min1,
        CandleInterval::Min2,
        CandleInterval::Min3,
        CandleInterval::Min5,
        CandleInterval::Min10,
        CandleInterval::Min15,
        CandleInterval::Min30,
        CandleInterval::Hour,
        CandleInterval::Hour2,
        CandleInterval::Hour4,
        CandleInterval::Day,
        CandleInterval::Week,
        CandleInterval::Month
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CandleInterval::Unspecified => "CANDLE_INTERVAL_UNSPECIFIED",
            CandleInterval::Sec5 => "CANDLE_INTERVAL_5_SEC",
            CandleInterval::Sec10 => "CANDLE_INTERVAL_10_SEC",
            CandleInterval::Sec30 => "CANDLE_INTERVAL_30_SEC",
            CandleInterval::Min1 => "CANDLE_INTERVAL_1_MIN",
            CandleInterval::Min2 => "CANDLE_INTERVAL_2_MIN",
            CandleInterval::Min3 => "CANDLE_INTERVAL_3_MIN",
            CandleInterval::Min5 => "CANDLE_INTERVAL_5_MIN",
            CandleInterval::Min10 => "CANDLE_INTERVAL_10_MIN",
            CandleInterval::Min15 => "CANDLE_INTERVAL_15_MIN",
            CandleInterval::Min30 => "CANDLE_INTERVAL_30_MIN",
            CandleInterval::Hour => "CANDLE_INTERVAL_HOUR",
            CandleInterval::Hour2 => "CANDLE_INTERVAL_2_HOUR",
            CandleInterval::Hour4 => "CANDLE_INTERVAL_4_HOUR",
            CandleInterval::Day => "CANDLE_INTERVAL_DAY",
            CandleInterval::Week => "CANDLE_INTERVAL_WEEK",
            CandleInterval::Month => "CANDLE_INTERVAL_MONTH"
        }
    }

    /// Day, week and month candles are built from daily history; everything else from minutes.
    pub fn is_daily_based(&self) -> bool {
        matches!(
            self,
            CandleInterval::Day | CandleInterval::Week | CandleInterval::Month
        )
    }
}

impl fmt::Display for CandleInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fixed-point decimal: `units` plus `nano` billionths.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Quotation {
    #[serde(
        default,
        serialize_with = "serialize_i64_str",
        deserialize_with = "deserialize_i64_str"
    )]
    pub units: i64,
    #[serde(default)]
    pub nano: i32
}

impl Quotation {
    pub fn to_f64(&self) -> f64 {
        self.units as f64 + self.nano as f64 / 1_000_000_000.0
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct MoneyValue {
    #[serde(default)]
    pub currency: String,
    #[serde(
        default,
        serialize_with = "serialize_i64_str",
        deserialize_with = "deserialize_i64_str"
    )]
    pub units: i64,
    #[serde(default)]
    pub nano: i32
}

impl MoneyValue {
    pub fn to_f64(&self) -> f64 {
        self.units as f64 + self.nano as f64 / 1_000_000_000.0
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoricCandle {
    #[serde(default)]
    pub open: Quotation,
    #[serde(default)]
    pub high: Quotation,
    #[serde(default)]
    pub low: Quotation,
    #[serde(default)]
    pub close: Quotation,
    #[serde(
        default,
        serialize_with = "serialize_i64_str",
        deserialize_with = "deserialize_i64_str"
    )]
    pub volume: i64,
    #[serde(with = "crate::custom_datetime")]
    pub time: DateTime<Utc>,
    #[serde(default)]
    pub is_complete: bool
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GetCandlesRequest {
    pub instrument_id: String,
    pub interval: CandleInterval,
    #[serde(with = "crate::custom_datetime")]
    pub from: DateTime<Utc>,
    #[serde(with = "crate::custom_datetime")]
    pub to: DateTime<Utc>
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GetCandlesResponse {
    #[serde(default)]
    pub candles: Vec<HistoricCandle>
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LastPrice {
    #[serde(default)]
    pub figi: String,
    pub price: Option<Quotation>,
    #[serde(default, with = "crate::custom_datetime::option")]
    pub time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub instrument_uid: String
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GetLastPricesResponse {
    #[serde(default)]
    pub last_prices: Vec<LastPrice>
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GetOrderBookRequest {
    pub instrument_id: String,
    pub depth: i32
}

/// One price level of an order book.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Order {
    pub price: Option<Quotation>,
    #[serde(
        default,
        serialize_with = "serialize_i64_str",
        deserialize_with = "deserialize_i64_str"
    )]
    pub quantity: i64
}

/// Order book snapshot; `bids` and `asks` are ordered best price first.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GetOrderBookResponse {
    #[serde(default)]
    pub figi: String,
    #[serde(default)]
    pub depth: i32,
    #[serde(default)]
    pub bids: Vec<Order>,
    #[serde(default)]
    pub asks: Vec<Order>,
    pub last_price: Option<Quotation>,
    pub close_price: Option<Quotation>,
    pub limit_up: Option<Quotation>,
    pub limit_down: Option<Quotation>,
    #[serde(default, with = "crate::custom_datetime::option")]
    pub last_price_ts: Option<DateTime<Utc>>,
    #[serde(default, with = "crate::custom_datetime::option")]
    pub close_price_ts: Option<DateTime<Utc>>,
    #[serde(default, with = "crate::custom_datetime::option")]
    pub orderbook_ts: Option<DateTime<Utc>>,
    #[serde(default)]
    pub instrument_uid: String
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GetTradingStatusResponse {
    #[serde(default)]
    pub figi: String,
    /// Remote enum name, e.g. `SECURITY_TRADING_STATUS_NORMAL_TRADING`
    #[serde(default)]
    pub trading_status: String,
    #[serde(default)]
    pub limit_order_available_flag: bool,
    #[serde(default)]
    pub market_order_available_flag: bool,
    #[serde(default)]
    pub api_trade_available_flag: bool,
    #[serde(default)]
    pub instrument_uid: String
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GetTradingStatusesResponse {
    #[serde(default)]
    pub trading_statuses: Vec<GetTradingStatusResponse>
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GetLastTradesRequest {
    pub instrument_id: String,
    #[serde(with = "crate::custom_datetime")]
    pub from: DateTime<Utc>,
    #[serde(with = "crate::custom_datetime")]
    pub to: DateTime<Utc>
}

/// Anonymous trade print.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Trade {
    #[serde(default)]
    pub figi: String,
    #[serde(default)]
    pub direction: String,
    pub price: Option<Quotation>,
    #[serde(
        default,
        serialize_with = "serialize_i64_str",
        deserialize_with = "deserialize_i64_str"
    )]
    pub quantity: i64,
    #[serde(default, with = "crate::custom_datetime::option")]
    pub time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub instrument_uid: String
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GetLastTradesResponse {
    #[serde(default)]
    pub trades: Vec<Trade>
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InstrumentClosePriceRequest {
    pub instrument_id: String
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GetClosePricesRequest {
    pub instruments: Vec<InstrumentClosePriceRequest>
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InstrumentClosePrice {
    #[serde(default)]
    pub figi: String,
    #[serde(default)]
    pub instrument_uid: String,
    pub price: Option<Quotation>,
    #[serde(default, with = "crate::custom_datetime::option")]
    pub time: Option<DateTime<Utc>>
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GetClosePricesResponse {
    #[serde(default)]
    pub close_prices: Vec<InstrumentClosePrice>
}

/// Search hit returned by the instruments service.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InstrumentShort {
    #[serde(default)]
    pub figi: String,
    #[serde(default)]
    pub ticker: String,
    #[serde(default)]
    pub uid: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub instrument_type: String,
    #[serde(
        rename = "first1minCandleDate",
        default,
        with = "crate::custom_datetime::option"
    )]
    pub first_1min_candle_date: Option<DateTime<Utc>>,
    #[serde(
        rename = "first1dayCandleDate",
        default,
        with = "crate::custom_datetime::option"
    )]
    pub first_1day_candle_date: Option<DateTime<Utc>>
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FindInstrumentResponse {
    #[serde(default)]
    pub instruments: Vec<InstrumentShort>
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioPosition {
    #[serde(default)]
    pub figi: String,
    #[serde(default)]
    pub instrument_type: String,
    pub quantity: Option<Quotation>,
    pub average_position_price: Option<MoneyValue>,
    pub expected_yield: Option<Quotation>,
    pub current_price: Option<MoneyValue>,
    #[serde(default)]
    pub instrument_uid: String
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioResponse {
    #[serde(default)]
    pub account_id: String,
    pub total_amount_shares: Option<MoneyValue>,
    pub total_amount_bonds: Option<MoneyValue>,
    pub total_amount_etf: Option<MoneyValue>,
    pub total_amount_currencies: Option<MoneyValue>,
    pub total_amount_futures: Option<MoneyValue>,
    pub total_amount_portfolio: Option<MoneyValue>,
    pub expected_yield: Option<Quotation>,
    #[serde(default)]
    pub positions: Vec<PortfolioPosition>
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionsMoney {
    pub available_value: Option<MoneyValue>,
    pub blocked_value: Option<MoneyValue>
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionsSecurities {
    #[serde(default)]
    pub figi: String,
    #[serde(
        default,
        serialize_with = "serialize_i64_str",
        deserialize_with = "deserialize_i64_str"
    )]
    pub blocked: i64,
    #[serde(
        default,
        serialize_with = "serialize_i64_str",
        deserialize_with = "deserialize_i64_str"
    )]
    pub balance: i64,
    #[serde(default)]
    pub instrument_uid: String,
    #[serde(default)]
    pub instrument_type: String
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionData {
    #[serde(default)]
    pub account_id: String,
    #[serde(default)]
    pub money: Vec<PositionsMoney>,
    #[serde(default)]
    pub securities: Vec<PositionsSecurities>,
    #[serde(default, with = "crate::custom_datetime::option")]
    pub date: Option<DateTime<Utc>>
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderTrade {
    #[serde(default, with = "crate::custom_datetime::option")]
    pub date_time: Option<DateTime<Utc>>,
    pub price: Option<Quotation>,
    #[serde(
        default,
        serialize_with = "serialize_i64_str",
        deserialize_with = "deserialize_i64_str"
    )]
    pub quantity: i64,
    #[serde(default)]
    pub trade_id: String
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderTrades {
    #[serde(default)]
    pub order_id: String,
    #[serde(default, with = "crate::custom_datetime::option")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub direction: String,
    #[serde(default)]
    pub figi: String,
    #[serde(default)]
    pub trades: Vec<OrderTrade>,
    #[serde(default)]
    pub account_id: String,
    #[serde(default)]
    pub instrument_uid: String
}

/// Keepalive frame sent by the server on every stream.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Ping {
    #[serde(default, with = "crate::custom_datetime::option")]
    pub time: Option<DateTime<Utc>>
}

/// Subscription request body shared by the account-scoped streams.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AccountsRequest {
    pub accounts: Vec<String>
}

// Stream frames are single-key objects: the key names the payload kind.
fn split_frame(frame: Map<String, Value>) -> (String, Value) {
    frame
        .into_iter()
        .next()
        .unwrap_or_else(|| (String::new(), Value::Null))
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "Map<String, Value>")]
pub enum PortfolioStreamResponse {
    Portfolio(PortfolioResponse),
    Ping(Ping),
    Subscriptions(Value),
    Unknown(String)
}

impl TryFrom<Map<String, Value>> for PortfolioStreamResponse {
    type Error = serde_json::Error;

    fn try_from(frame: Map<String, Value>) -> Result<Self, Self::Error> {
        let (kind, body) = split_frame(frame);
        Ok(match kind.as_str() {
            "portfolio" => PortfolioStreamResponse::Portfolio(serde_json::from_value(body)?),
            "ping" => PortfolioStreamResponse::Ping(serde_json::from_value(body)?),
            "subscriptions" => PortfolioStreamResponse::Subscriptions(body),
            _ => PortfolioStreamResponse::Unknown(kind)
        })
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "Map<String, Value>")]
pub enum PositionsStreamResponse {
    Position(PositionData),
    Ping(Ping),
    Subscriptions(Value),
    InitialPositions(Value),
    Unknown(String)
}

impl TryFrom<Map<String, Value>> for PositionsStreamResponse {
    type Error = serde_json::Error;

    fn try_from(frame: Map<String, Value>) -> Result<Self, Self::Error> {
        let (kind, body) = split_frame(frame);
        Ok(match kind.as_str() {
            "position" => PositionsStreamResponse::Position(serde_json::from_value(body)?),
            "ping" => PositionsStreamResponse::Ping(serde_json::from_value(body)?),
            "subscriptions" => PositionsStreamResponse::Subscriptions(body),
            "initialPositions" => PositionsStreamResponse::InitialPositions(body),
            _ => PositionsStreamResponse::Unknown(kind)
        })
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "Map<String, Value>")]
pub enum TradesStreamResponse {
    OrderTrades(OrderTrades),
    Ping(Ping),
    Subscription(Value),
    Unknown(String)
}

impl TryFrom<Map<String, Value>> for TradesStreamResponse {
    type Error = serde_json::Error;

    fn try_from(frame: Map<String, Value>) -> Result<Self, Self::Error> {
        let (kind, body) = split_frame(frame);
        Ok(match kind.as_str() {
            "orderTrades" => TradesStreamResponse::OrderTrades(serde_json::from_value(body)?),
            "ping" => TradesStreamResponse::Ping(serde_json::from_value(body)?),
            "subscription" => TradesStreamResponse::Subscription(body),
            _ => TradesStreamResponse::Unknown(kind)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_interval_serde() {
        let interval: CandleInterval = serde_json::from_str("\"CANDLE_INTERVAL_1_MIN\"").unwrap();
        assert_eq!(interval, CandleInterval::Min1);

        for interval in CandleInterval::ALL {
            let serialized = serde_json::to_string(&interval).unwrap();
            assert_eq!(serialized, format!("\"{}\"", interval));
        }
    }

    #[test]
    fn test_quotation_to_f64() {
        let q = Quotation {
            units: 114,
            nano: 250_000_000
        };
        assert_eq!(q.to_f64(), 114.25);

        let negative = Quotation {
            units: -3,
            nano: -500_000_000
        };
        assert_eq!(negative.to_f64(), -3.5);
    }

    #[test]
    fn test_candles_response_parsing() {
        let response = r#"{
            "candles": [
                {
                    "open": {"units": "250", "nano": 100000000},
                    "high": {"units": "251", "nano": 0},
                    "low": {"units": "249", "nano": 990000000},
                    "close": {"units": "250", "nano": 500000000},
                    "volume": "12931",
                    "time": "2023-04-18T07:00:00Z",
                    "isComplete": true
                },
                {
                    "open": {"units": "250", "nano": 500000000},
                    "high": {"units": "250", "nano": 700000000},
                    "low": {"units": "250"},
                    "close": {"units": "250", "nano": 200000000},
                    "volume": "881",
                    "time": "2023-04-18T08:00:00Z",
                    "isComplete": false
                }
            ]
        }"#;

        let parsed: GetCandlesResponse = serde_json::from_str(response).unwrap();
        assert_eq!(parsed.candles.len(), 2);
        assert_eq!(parsed.candles[0].volume, 12931);
        assert!((parsed.candles[0].open.to_f64() - 250.1).abs() < 1e-9);
        assert_eq!(
            parsed.candles[1].time,
            Utc.with_ymd_and_hms(2023, 4, 18, 8, 0, 0).unwrap()
        );
        assert_eq!(parsed.candles[1].low.nano, 0);
        assert!(!parsed.candles[1].is_complete);
    }

    #[test]
    fn test_find_instrument_parsing() {
        let response = r#"{
            "instruments": [
                {
                    "figi": "BBG004730N88",
                    "ticker": "SBER",
                    "uid": "e6123145-9665-43e0-8413-cd61b8aa9b13",
                    "name": "Sberbank",
                    "instrumentType": "share",
                    "first1minCandleDate": "2018-03-07T18:33:00Z",
                    "first1dayCandleDate": "2000-01-04T07:00:00Z"
                }
            ]
        }"#;

        let parsed: FindInstrumentResponse = serde_json::from_str(response).unwrap();
        let sber = &parsed.instruments[0];
        assert_eq!(sber.ticker, "SBER");
        assert_eq!(
            sber.first_1day_candle_date,
            Some(Utc.with_ymd_and_hms(2000, 1, 4, 7, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_portfolio_frames() {
        let frame: PortfolioStreamResponse = serde_json::from_str(
            r#"{"portfolio": {"accountId": "2000123456",
                "positions": [{"figi": "BBG004730N88", "quantity": {"units": "10"}}]}}"#
        )
        .unwrap();
        match frame {
            PortfolioStreamResponse::Portfolio(portfolio) => {
                assert_eq!(portfolio.account_id, "2000123456");
                assert_eq!(portfolio.positions.len(), 1);
                assert_eq!(portfolio.positions[0].quantity.unwrap().units, 10);
            }
            other => panic!("unexpected frame {:?}", other)
        }

        let ping: PortfolioStreamResponse =
            serde_json::from_str(r#"{"ping": {"time": "2023-04-18T07:00:00Z"}}"#).unwrap();
        assert!(matches!(ping, PortfolioStreamResponse::Ping(_)));

        let unknown: PortfolioStreamResponse =
            serde_json::from_str(r#"{"somethingNew": {}}"#).unwrap();
        assert_eq!(unknown, PortfolioStreamResponse::Unknown("somethingNew".to_string()));
    }

    #[test]
    fn test_positions_and_trades_frames() {
        let position: PositionsStreamResponse = serde_json::from_str(
            r#"{"position": {"accountId": "1",
                "securities": [{"figi": "X", "balance": "5", "blocked": 0}]}}"#
        )
        .unwrap();
        match position {
            PositionsStreamResponse::Position(data) => assert_eq!(data.securities[0].balance, 5),
            other => panic!("unexpected frame {:?}", other)
        }

        let trades: TradesStreamResponse = serde_json::from_str(
            r#"{"orderTrades": {"orderId": "42", "direction": "ORDER_DIRECTION_BUY",
                "trades": [{"quantity": "3", "tradeId": "t1"}]}}"#
        )
        .unwrap();
        match trades {
            TradesStreamResponse::OrderTrades(order) => {
                assert_eq!(order.order_id, "42");
                assert_eq!(order.trades[0].quantity, 3);
            }
            other => panic!("unexpected frame {:?}", other)
        }
    }

    #[test]
    fn test_malformed_payload_is_an_error() {
        let result = serde_json::from_str::<PortfolioStreamResponse>(
            r#"{"portfolio": {"positions": "not a list"}}"#
        );
        assert!(result.is_err());
    }
}
