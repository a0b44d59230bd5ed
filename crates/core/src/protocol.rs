// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wire protocol grammar for the control link.
//!
//! ```text
//! CAR <name> <low> <high>         car -> controller, registration
//! STATUS <status> <cur> <dst>     car -> controller, state update
//! INDIVIDUAL SERVICE              car -> controller, terminal
//! EMERGENCY                       car -> controller, terminal
//! FLOOR <label>                   controller -> car, next stop
//! CALL <src> <dst>                client -> controller
//! CAR <name>                      controller -> client, assignment
//! UNAVAILABLE                     controller -> client
//! ```

use std::fmt;

use crate::error::ProtocolError;
use crate::floor::FloorIndex;

/// The five door/motion states a car can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CarStatus {
    Closed,
    Opening,
    Open,
    Closing,
    Between,
}

impl CarStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CarStatus::Closed => "Closed",
            CarStatus::Opening => "Opening",
            CarStatus::Open => "Open",
            CarStatus::Closing => "Closing",
            CarStatus::Between => "Between",
        }
    }

    pub fn parse(s: &str) -> Result<Self, ProtocolError> {
        match s {
            "Closed" => Ok(CarStatus::Closed),
            "Opening" => Ok(CarStatus::Opening),
            "Open" => Ok(CarStatus::Open),
            "Closing" => Ok(CarStatus::Closing),
            "Between" => Ok(CarStatus::Between),
            other => Err(ProtocolError(other.to_string())),
        }
    }
}

impl fmt::Display for CarStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A parsed control-link message, in either direction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    /// `CAR <name> <low> <high>` (car -> controller, registration).
    CarRegister {
        name: String,
        low: FloorIndex,
        high: FloorIndex,
    },
    /// `STATUS <status> <cur> <dst>` (car -> controller).
    Status {
        status: CarStatus,
        current: FloorIndex,
        destination: FloorIndex,
    },
    /// `INDIVIDUAL SERVICE` (car -> controller, terminal).
    IndividualService,
    /// `EMERGENCY` (car -> controller, terminal).
    Emergency,
    /// `FLOOR <label>` (controller -> car).
    Floor(FloorIndex),
    /// `CALL <src> <dst>` (client -> controller).
    Call { src: FloorIndex, dst: FloorIndex },
    /// `CAR <name>` (controller -> client, assignment).
    CarAssigned { name: String },
    /// `UNAVAILABLE` (controller -> client).
    Unavailable,
}

impl Message {
    /// Parse a decoded payload into a message. Unrecognised payloads,
    /// wrong arity, or bad floor labels all produce [`ProtocolError`].
    pub fn parse(payload: &str) -> Result<Self, ProtocolError> {
        let err = || ProtocolError(payload.to_string());
        let mut parts = payload.split(' ');
        let head = parts.next().ok_or_else(err)?;
        match head {
            "CAR" => {
                let name = parts.next().ok_or_else(err)?;
                match (parts.next(), parts.next(), parts.next()) {
                    (Some(low), Some(high), None) => {
                        let low = FloorIndex::parse(low).map_err(|_| err())?;
                        let high = FloorIndex::parse(high).map_err(|_| err())?;
                        Ok(Message::CarRegister {
                            name: name.to_string(),
                            low,
                            high,
                        })
                    }
                    (None, None, None) => Ok(Message::CarAssigned {
                        name: name.to_string(),
                    }),
                    _ => Err(err()),
                }
            }
            "STATUS" => {
                let status = parts.next().ok_or_else(err)?;
                let cur = parts.next().ok_or_else(err)?;
                let dst = parts.next().ok_or_else(err)?;
                if parts.next().is_some() {
                    return Err(err());
                }
                Ok(Message::Status {
                    status: CarStatus::parse(status).map_err(|_| err())?,
                    current: FloorIndex::parse(cur).map_err(|_| err())?,
                    destination: FloorIndex::parse(dst).map_err(|_| err())?,
                })
            }
            "INDIVIDUAL" => {
                if parts.next() == Some("SERVICE") && parts.next().is_none() {
                    Ok(Message::IndividualService)
                } else {
                    Err(err())
                }
            }
            "EMERGENCY" => {
                if parts.next().is_none() {
                    Ok(Message::Emergency)
                } else {
                    Err(err())
                }
            }
            "FLOOR" => {
                let label = parts.next().ok_or_else(err)?;
                if parts.next().is_some() {
                    return Err(err());
                }
                Ok(Message::Floor(FloorIndex::parse(label).map_err(|_| err())?))
            }
            "CALL" => {
                let src = parts.next().ok_or_else(err)?;
                let dst = parts.next().ok_or_else(err)?;
                if parts.next().is_some() {
                    return Err(err());
                }
                Ok(Message::Call {
                    src: FloorIndex::parse(src).map_err(|_| err())?,
                    dst: FloorIndex::parse(dst).map_err(|_| err())?,
                })
            }
            "UNAVAILABLE" => {
                if parts.next().is_none() {
                    Ok(Message::Unavailable)
                } else {
                    Err(err())
                }
            }
            _ => Err(err()),
        }
    }

    /// Render back to the wire payload (without the length prefix).
    pub fn render(&self) -> String {
        match self {
            Message::CarRegister { name, low, high } => {
                format!("CAR {name} {low} {high}")
            }
            Message::Status {
                status,
                current,
                destination,
            } => format!("STATUS {status} {current} {destination}"),
            Message::IndividualService => "INDIVIDUAL SERVICE".to_string(),
            Message::Emergency => "EMERGENCY".to_string(),
            Message::Floor(label) => format!("FLOOR {label}"),
            Message::Call { src, dst } => format!("CALL {src} {dst}"),
            Message::CarAssigned { name } => format!("CAR {name}"),
            Message::Unavailable => "UNAVAILABLE".to_string(),
        }
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

#[cfg(test)]
#[path = "protocol_tests.rs"]
mod tests;
