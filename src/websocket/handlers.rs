//! Inbound frame decoding.
//!
//! Turns each text frame into an [`InboundFrame`] the connection task acts on.

use serde_json::Value;

use crate::websocket::error::{WebSocketError, WsResult};
use crate::websocket::types::{HouseBetFrame, MultiplierUpdate, RawFrame};

/// Decoded server frame
#[derive(Debug, Clone, PartialEq)]
pub enum InboundFrame {
    ConnectionAck,
    Error(Value),
    Pong,
    BalanceUpdate(Value),
    MultiplierUpdate(MultiplierUpdate),
    /// Valid frame this client does not act on (type kept for logging)
    Unrecognized(String),
}

/// Decode one text frame.
pub fn decode_frame(text: &str) -> WsResult<InboundFrame> {
    let raw: RawFrame = serde_json::from_str(text)?;

    match raw.type_.as_str() {
        "connection_ack" => Ok(InboundFrame::ConnectionAck),
        "pong" => Ok(InboundFrame::Pong),
        "error" => Ok(InboundFrame::Error(raw.payload.unwrap_or(Value::Null))),
        "next" => decode_next(raw),
        other => Ok(InboundFrame::Unrecognized(other.to_string())),
    }
}

fn decode_next(raw: RawFrame) -> WsResult<InboundFrame> {
    let Some(mut data) = raw.payload.and_then(|mut p| p.get_mut("data").map(Value::take)) else {
        return Ok(InboundFrame::Unrecognized(raw.type_));
    };

    if let Some(balances) = data.get_mut("availableBalances").filter(|v| !v.is_null()) {
        return Ok(InboundFrame::BalanceUpdate(balances.take()));
    }

    if let Some(house_bet) = data.get_mut("houseBets").filter(|v| !v.is_null()) {
        let frame: HouseBetFrame = serde_json::from_value(house_bet.take()).map_err(|e| {
            WebSocketError::MessageParseError(format!("houseBets: {}", e))
        })?;
        return Ok(InboundFrame::MultiplierUpdate(frame.into()));
    }

    Ok(InboundFrame::Unrecognized(raw.type_))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_ack_pong_error() {
        assert_eq!(
            decode_frame(r#"{"type":"connection_ack"}"#).unwrap(),
            InboundFrame::ConnectionAck
        );
        assert_eq!(decode_frame(r#"{"type":"pong"}"#).unwrap(), InboundFrame::Pong);
        assert_eq!(
            decode_frame(r#"{"type":"error","id":"x","payload":[{"message":"bad"}]}"#).unwrap(),
            InboundFrame::Error(json!([{"message": "bad"}]))
        );
    }

    #[test]
    fn test_decode_balance_update() {
        let text = json!({
            "id": "s2",
            "type": "next",
            "payload": {"data": {"availableBalances": {
                "amount": 1.5,
                "identifier": "x",
                "balance": {"amount": 1.5, "currency": "btc"}
            }}}
        })
        .to_string();

        match decode_frame(&text).unwrap() {
            InboundFrame::BalanceUpdate(payload) => {
                assert_eq!(payload["balance"]["currency"], "btc");
            }
            other => panic!("Expected BalanceUpdate, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_multiplier_update() {
        let text = json!({
            "id": "s1",
            "type": "next",
            "payload": {"data": {"houseBets": {
                "iid": "house:9",
                "game": {"name": "Le Bandit"},
                "bet": {"payoutMultiplier": 250.0, "payout": 50.0, "currency": "usdt", "amount": 0.2}
            }}}
        })
        .to_string();

        assert_eq!(
            decode_frame(&text).unwrap(),
            InboundFrame::MultiplierUpdate(MultiplierUpdate {
                multiplier: 250.0,
                payout: 50.0,
                currency: "usdt".to_string(),
                amount: 0.2,
                slot_name: "Le Bandit".to_string(),
                iid: "house:9".to_string(),
            })
        );
    }

    #[test]
    fn test_decode_unrecognized_and_invalid() {
        assert_eq!(
            decode_frame(r#"{"type":"complete","id":"s1"}"#).unwrap(),
            InboundFrame::Unrecognized("complete".to_string())
        );
        assert_eq!(
            decode_frame(r#"{"type":"next","payload":{"data":{"other":1}}}"#).unwrap(),
            InboundFrame::Unrecognized("next".to_string())
        );
        assert!(matches!(
            decode_frame("not json"),
            Err(WebSocketError::MessageParseError(_))
        ));
        assert!(matches!(
            decode_frame(r#"{"type":"next","payload":{"data":{"houseBets":"oops"}}}"#),
            Err(WebSocketError::MessageParseError(_))
        ));
    }

    #[test]
    fn test_decode_house_bet_with_null_fields() {
        let text = json!({
            "type": "next",
            "payload": {"data": {"houseBets": {
                "iid": 42,
                "game": {"name": "Dice"},
                "bet": {"payoutMultiplier": 2.0, "payout": null, "currency": "ltc", "amount": null}
            }}}
        })
        .to_string();

        match decode_frame(&text).unwrap() {
            InboundFrame::MultiplierUpdate(update) => {
                assert_eq!(update.iid, "42");
                assert_eq!(update.multiplier, 2.0);
                assert_eq!(update.payout, 0.0);
                assert_eq!(update.slot_name, "Dice");
            }
            other => panic!("Expected MultiplierUpdate, got {:?}", other),
        }
    }
}
