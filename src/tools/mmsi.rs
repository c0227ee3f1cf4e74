//! Maritime Mobile Service Identities (ITU-R M.585)

use std::sync::Arc;

use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::checksum::{is_all_digits, random_digits, strip_separators};
use super::{
    action_param, count_param, default_count, identifier_result_schema, require_value,
    value_param, Action, ObjectSchema, Param, TypedTool, Verdict,
};
use crate::capabilities::Entropy;
use crate::error::ExecutionError;

/// Range of Maritime Identification Digits assigned to administrations
pub const MID_RANGE: std::ops::RangeInclusive<u32> = 201..=775;

/// Station category encoded by an MMSI's leading digits
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StationKind {
    #[default]
    Ship,
    Group,
    Coast,
    SarAircraft,
    AisSart,
    ManOverboard,
    Epirb,
    CraftAssociated,
    AidToNavigation,
    Handheld,
}

impl StationKind {
    /// Kinds the generator produces
    pub const GENERATABLE: &'static [&'static str] = &[
        "ship",
        "group",
        "coast",
        "sar_aircraft",
        "ais_sart",
        "aid_to_navigation",
    ];

    pub const ALL: &'static [&'static str] = &[
        "ship",
        "group",
        "coast",
        "sar_aircraft",
        "ais_sart",
        "man_overboard",
        "epirb",
        "craft_associated",
        "aid_to_navigation",
        "handheld",
    ];
}

/// Station kind and MID (where the format carries one) of a 9 digit MMSI
pub fn classify(mmsi: &str) -> Option<(StationKind, Option<u32>)> {
    let mid_at = |start: usize| mmsi.get(start..start + 3).and_then(|m| m.parse().ok());
    let first = mmsi.chars().next()?;

    let classified = if mmsi.starts_with("00") {
        (StationKind::Coast, mid_at(2))
    } else if first == '0' {
        (StationKind::Group, mid_at(1))
    } else if mmsi.starts_with("111") {
        (StationKind::SarAircraft, mid_at(3))
    } else if mmsi.starts_with("970") {
        (StationKind::AisSart, None)
    } else if mmsi.starts_with("972") {
        (StationKind::ManOverboard, None)
    } else if mmsi.starts_with("974") {
        (StationKind::Epirb, None)
    } else if mmsi.starts_with("98") {
        (StationKind::CraftAssociated, mid_at(2))
    } else if mmsi.starts_with("99") {
        (StationKind::AidToNavigation, mid_at(2))
    } else if first == '8' {
        (StationKind::Handheld, mid_at(1))
    } else if ('2'..='7').contains(&first) {
        (StationKind::Ship, mid_at(0))
    } else {
        return None;
    };
    Some(classified)
}

/// Verdict, station kind and MID of an MMSI
pub fn check(value: &str) -> (Verdict, Option<StationKind>, Option<u32>) {
    let normalized = strip_separators(value);
    if !is_all_digits(&normalized) || normalized.len() != 9 {
        return (
            Verdict::invalid(normalized, "MMSI has exactly 9 digits"),
            None,
            None,
        );
    }
    let Some((kind, mid)) = classify(&normalized) else {
        return (
            Verdict::invalid(normalized, "unassigned MMSI prefix"),
            None,
            None,
        );
    };
    if let Some(mid) = mid {
        if !MID_RANGE.contains(&mid) {
            let reason = format!(
                "MID {} is outside {}-{}",
                mid,
                MID_RANGE.start(),
                MID_RANGE.end()
            );
            return (Verdict::invalid(normalized, reason), Some(kind), Some(mid));
        }
    }
    (Verdict::valid(normalized), Some(kind), mid)
}

/// Generates or validates MMSIs
pub struct MmsiTool {
    entropy: Arc<Entropy>,
}

impl MmsiTool {
    pub fn new(entropy: Arc<Entropy>) -> Self {
        Self { entropy }
    }

    fn generate(&self, kind: StationKind, mid: Option<u32>) -> Result<String, ExecutionError> {
        let mid = mid.unwrap_or_else(|| self.entropy.with(|rng| rng.gen_range(MID_RANGE)));
        let mmsi = match kind {
            StationKind::Ship => format!("{}{}", mid, random_digits(&self.entropy, 6)),
            StationKind::Group => format!("0{}{}", mid, random_digits(&self.entropy, 5)),
            StationKind::Coast => format!("00{}{}", mid, random_digits(&self.entropy, 4)),
            StationKind::SarAircraft => format!("111{}{}", mid, random_digits(&self.entropy, 3)),
            StationKind::AisSart => format!("970{}", random_digits(&self.entropy, 6)),
            StationKind::AidToNavigation => {
                format!("99{}{}", mid, random_digits(&self.entropy, 4))
            }
            other => {
                return Err(ExecutionError::Unsupported(format!(
                    "generating {:?} identities",
                    other
                )))
            }
        };
        Ok(mmsi)
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MmsiInput {
    #[serde(default)]
    pub action: Action,
    #[serde(default)]
    pub kind: StationKind,
    pub mid: Option<u32>,
    #[serde(default = "default_count")]
    pub count: usize,
    pub value: Option<String>,
}

#[derive(Debug, Default, Serialize)]
pub struct MmsiOutput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub values: Option<Vec<String>>,
    #[serde(flatten)]
    pub verdict: Option<Verdict>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<StationKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mid: Option<u32>,
}

impl TypedTool for MmsiTool {
    type Input = MmsiInput;
    type Output = MmsiOutput;

    const NAME: &'static str = "mmsi";
    const DESCRIPTION: &'static str =
        "Generate MMSI numbers for a station kind and MID, or validate an MMSI and report its station kind.";

    fn params_schema(&self) -> ObjectSchema {
        ObjectSchema::new()
            .param(action_param())
            .param(
                Param::string("kind", "Station kind to generate")
                    .one_of(StationKind::GENERATABLE)
                    .default_value(json!("ship")),
            )
            .param(
                Param::integer("mid", "Maritime Identification Digits (random when omitted)")
                    .range(f64::from(*MID_RANGE.start()), f64::from(*MID_RANGE.end())),
            )
            .param(count_param())
            .param(value_param("MMSI to validate"))
    }

    fn result_schema(&self) -> ObjectSchema {
        identifier_result_schema()
            .param(Param::string("kind", "Station kind").one_of(StationKind::ALL))
            .param(Param::integer("mid", "Maritime Identification Digits"))
    }

    fn run(&self, input: MmsiInput) -> Result<MmsiOutput, ExecutionError> {
        match input.action {
            Action::Generate => {
                let values = (0..input.count)
                    .map(|_| self.generate(input.kind, input.mid))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(MmsiOutput {
                    values: Some(values),
                    kind: Some(input.kind),
                    mid: input.mid,
                    ..Default::default()
                })
            }
            Action::Validate => {
                let value = require_value(Self::NAME, input.value)?;
                let (verdict, kind, mid) = check(&value);
                Ok(MmsiOutput {
                    verdict: Some(verdict),
                    kind,
                    mid,
                    ..Default::default()
                })
            }
        }
    }
}
