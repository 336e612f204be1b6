//! Settings of the engine and of the dissectors

use std::ops::RangeInclusive;

use crate::column::time::TimeDisplay;

/// 9P settings
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NinePPrefs {
    pub tcp_port: u16,
}

impl Default for NinePPrefs {
    fn default() -> Self {
        NinePPrefs { tcp_port: 564 }
    }
}

/// collectd settings
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CollectdPrefs {
    pub udp_port: u16,
}

impl Default for CollectdPrefs {
    fn default() -> Self {
        CollectdPrefs { udp_port: 25826 }
    }
}

/// LBT-RU settings
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LbtruPrefs {
    /// UDP ports used by sources
    pub source_ports: RangeInclusive<u16>,
    /// UDP ports used by receivers
    pub receiver_ports: RangeInclusive<u16>,
    /// Track sequence numbers per client
    pub sequence_analysis: bool,
}

impl Default for LbtruPrefs {
    fn default() -> Self {
        LbtruPrefs {
            source_ports: 14380..=14389,
            receiver_ports: 14360..=14379,
            sequence_analysis: true,
        }
    }
}

impl LbtruPrefs {
    pub fn is_source_port(&self, port: u16) -> bool {
        self.source_ports.contains(&port)
    }

    pub fn is_receiver_port(&self, port: u16) -> bool {
        self.receiver_ports.contains(&port)
    }
}

/// All settings
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Preferences {
    pub time: TimeDisplay,
    pub ninep: NinePPrefs,
    pub collectd: CollectdPrefs,
    pub lbtru: LbtruPrefs,
}
