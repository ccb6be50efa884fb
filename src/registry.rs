//! Channel registry
//!
//! This module defines the ordered catalogue of output channels. A registry
//! is built from an ordered list of modalities; each modality contributes
//! its channels in a fixed internal order, so channel index `i` of an
//! emitted sample always corresponds to `channels()[i]`. The catalogue is
//! immutable after construction and is the single source of truth for the
//! outward stream descriptor.

use crate::error::StreamError;
use crate::packet::ChannelTag;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One logical sensor subsystem producing one or more channels per sample
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Modality {
    Gsr,
    Ppg,
    Accel,
    Gyro,
    Mag,
    Battery,
}

impl Modality {
    /// All modalities, in standard emission order
    pub const ALL: [Modality; 6] = [
        Modality::Gsr,
        Modality::Ppg,
        Modality::Accel,
        Modality::Gyro,
        Modality::Mag,
        Modality::Battery,
    ];

    /// Stable identifier used for sticky error reporting
    pub fn id(&self) -> &'static str {
        match self {
            Modality::Gsr => "gsr",
            Modality::Ppg => "ppg",
            Modality::Accel => "accel",
            Modality::Gyro => "gyro",
            Modality::Mag => "mag",
            Modality::Battery => "battery",
        }
    }

    /// Parse a modality from its identifier
    pub fn from_id(id: &str) -> Option<Modality> {
        Modality::ALL.iter().copied().find(|m| m.id() == id)
    }

    /// Raw packet tags this modality reads each cycle
    pub fn tags(&self) -> &'static [ChannelTag] {
        match self {
            Modality::Gsr => &[ChannelTag::GsrRaw],
            Modality::Ppg => &[ChannelTag::Ppg],
            Modality::Accel => &[ChannelTag::AccelX, ChannelTag::AccelY, ChannelTag::AccelZ],
            Modality::Gyro => &[ChannelTag::GyroX, ChannelTag::GyroY, ChannelTag::GyroZ],
            Modality::Mag => &[ChannelTag::MagX, ChannelTag::MagY, ChannelTag::MagZ],
            Modality::Battery => &[ChannelTag::Battery],
        }
    }

    /// Output channels this modality contributes, as (label, unit) pairs.
    ///
    /// GSR emits its measured resistance plus the reference-resistor range
    /// index the reading was taken in.
    pub fn channel_defs(&self) -> &'static [(&'static str, &'static str)] {
        match self {
            Modality::Gsr => &[("GSR", "kOhms"), ("GSR_Range", "index")],
            Modality::Ppg => &[("PPG", "mV")],
            Modality::Accel => &[
                ("Accel_X", "m/s^2"),
                ("Accel_Y", "m/s^2"),
                ("Accel_Z", "m/s^2"),
            ],
            Modality::Gyro => &[
                ("Gyro_X", "deg/s"),
                ("Gyro_Y", "deg/s"),
                ("Gyro_Z", "deg/s"),
            ],
            Modality::Mag => &[
                ("Mag_X", "local_flux"),
                ("Mag_Y", "local_flux"),
                ("Mag_Z", "local_flux"),
            ],
            Modality::Battery => &[("Battery", "mV")],
        }
    }

    /// Number of output channels this modality contributes
    pub fn channel_count(&self) -> usize {
        self.channel_defs().len()
    }
}

impl fmt::Display for Modality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// One output channel: label, physical unit, and position in the sample
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelSpec {
    pub label: String,
    pub unit: String,
    pub index: usize,
}

/// Immutable ordered catalogue of output channels
#[derive(Debug, Clone)]
pub struct ChannelRegistry {
    modalities: Vec<Modality>,
    channels: Vec<ChannelSpec>,
}

impl ChannelRegistry {
    /// Build a registry from an ordered modality list.
    ///
    /// Channel indices are assigned contiguously in the given order and
    /// never change afterward.
    pub fn new(modalities: Vec<Modality>) -> Result<Self, StreamError> {
        if modalities.is_empty() {
            return Err(StreamError::EmptyRegistry);
        }
        Ok(Self::from_modalities(modalities))
    }

    /// The full catalogue: every supported modality, standard order
    pub fn standard() -> Self {
        Self::from_modalities(Modality::ALL.to_vec())
    }

    fn from_modalities(modalities: Vec<Modality>) -> Self {
        let mut channels = Vec::new();
        for modality in &modalities {
            for (label, unit) in modality.channel_defs() {
                channels.push(ChannelSpec {
                    label: (*label).to_string(),
                    unit: (*unit).to_string(),
                    index: channels.len(),
                });
            }
        }
        Self {
            modalities,
            channels,
        }
    }

    /// Output channels in emission order
    pub fn channels(&self) -> &[ChannelSpec] {
        &self.channels
    }

    /// Modalities in emission order
    pub fn modalities(&self) -> &[Modality] {
        &self.modalities
    }

    /// Number of output channels per sample
    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_standard_registry_layout() {
        let registry = ChannelRegistry::standard();
        assert_eq!(registry.len(), 13);

        let labels: Vec<&str> = registry.channels().iter().map(|c| c.label.as_str()).collect();
        assert_eq!(
            labels,
            vec![
                "GSR", "GSR_Range", "PPG", "Accel_X", "Accel_Y", "Accel_Z", "Gyro_X", "Gyro_Y",
                "Gyro_Z", "Mag_X", "Mag_Y", "Mag_Z", "Battery"
            ]
        );
    }

    #[test]
    fn test_indices_are_contiguous() {
        let registry = ChannelRegistry::standard();
        for (i, spec) in registry.channels().iter().enumerate() {
            assert_eq!(spec.index, i);
        }
    }

    #[test]
    fn test_subset_registry_preserves_order() {
        let registry =
            ChannelRegistry::new(vec![Modality::Gsr, Modality::Ppg, Modality::Accel]).unwrap();
        assert_eq!(registry.len(), 5);
        assert_eq!(registry.channels()[0].label, "GSR");
        assert_eq!(registry.channels()[2].label, "PPG");
        assert_eq!(registry.channels()[4].label, "Accel_Z");
        for (i, spec) in registry.channels().iter().enumerate() {
            assert_eq!(spec.index, i);
        }
    }

    #[test]
    fn test_empty_registry_is_rejected() {
        let result = ChannelRegistry::new(Vec::new());
        assert!(matches!(result, Err(StreamError::EmptyRegistry)));
    }

    #[test]
    fn test_modality_id_round_trip() {
        for modality in Modality::ALL {
            assert_eq!(Modality::from_id(modality.id()), Some(modality));
        }
        assert_eq!(Modality::from_id("ecg"), None);
    }

    #[test]
    fn test_channel_counts_match_tags() {
        // Every modality reads at least as many tags as it needs to fill
        // its channels, except GSR which derives two channels from one tag.
        assert_eq!(Modality::Gsr.channel_count(), 2);
        assert_eq!(Modality::Gsr.tags().len(), 1);
        for modality in [Modality::Accel, Modality::Gyro, Modality::Mag] {
            assert_eq!(modality.channel_count(), modality.tags().len());
        }
    }
}
