use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use strum_macros::EnumIter;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Copy, Serialize, Deserialize, EnumIter)]
#[serde(rename_all = "snake_case")]
pub enum Arm {
    Control,
    Treatment,
}

impl Arm {
    pub fn short_label(&self) -> &'static str {
        match self {
            Arm::Control => "A",
            Arm::Treatment => "B",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Arm::Control => "control",
            Arm::Treatment => "treatment",
        }
    }
}

impl fmt::Display for Arm {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Arm::Control => write!(f, "control (A)"),
            Arm::Treatment => write!(f, "treatment (B)"),
        }
    }
}

impl FromStr for Arm {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "control" | "A" => Ok(Arm::Control),
            "treatment" | "B" => Ok(Arm::Treatment),
            _ => bail!("Invalid Arm: {}", s),
        }
    }
}
