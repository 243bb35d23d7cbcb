//! Audio-Geraete-Enumeration und -Auswahl
//!
//! Stellt Funktionen bereit um verfuegbare Audio-Geraete mit ihren
//! Kanal-Faehigkeiten aufzulisten und Geraete per Namen zu finden.

use cpal::traits::{DeviceTrait, HostTrait};
use cpal::Device;
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::{AudioError, AudioResult};

/// Ein Audio-Geraet mit seinen Kanal-Faehigkeiten
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceInfo {
    /// Anzeigename des Geraets
    pub name: String,
    /// Maximale Eingangskanaele (0 = kein Eingabegeraet)
    pub max_input_channels: u16,
    /// Maximale Ausgangskanaele (0 = kein Ausgabegeraet)
    pub max_output_channels: u16,
}

impl DeviceInfo {
    pub fn is_input(&self) -> bool {
        self.max_input_channels > 0
    }

    pub fn is_output(&self) -> bool {
        self.max_output_channels > 0
    }
}

/// Sucht ein Eingabegeraet mit exakt passendem Namen
pub fn find_input<'a>(devices: &'a [DeviceInfo], name: &str) -> AudioResult<&'a DeviceInfo> {
    devices
        .iter()
        .find(|d| d.is_input() && d.name == name)
        .ok_or_else(|| AudioError::GeraetNichtGefunden(name.to_string()))
}

/// Sucht ein Ausgabegeraet mit exakt passendem Namen
pub fn find_output<'a>(devices: &'a [DeviceInfo], name: &str) -> AudioResult<&'a DeviceInfo> {
    devices
        .iter()
        .find(|d| d.is_output() && d.name == name)
        .ok_or_else(|| AudioError::GeraetNichtGefunden(name.to_string()))
}

/// Listet alle Geraete des Standard-Hosts auf
pub fn list_devices() -> AudioResult<Vec<DeviceInfo>> {
    let host = cpal::default_host();
    let devices = host
        .devices()
        .map_err(|e| AudioError::StreamFehler(e.to_string()))?;

    let mut result: Vec<DeviceInfo> = Vec::new();
    for device in devices {
        match device_to_info(&device) {
            // Manche Backends melden dasselbe Geraet getrennt fuer Ein- und Ausgabe
            Ok(info) => match result.iter_mut().find(|d| d.name == info.name) {
                Some(existing) => {
                    existing.max_input_channels =
                        existing.max_input_channels.max(info.max_input_channels);
                    existing.max_output_channels =
                        existing.max_output_channels.max(info.max_output_channels);
                }
                None => result.push(info),
            },
            Err(e) => warn!("Geraet konnte nicht gelesen werden: {}", e),
        }
    }
    debug!("Gefundene Geraete: {}", result.len());
    Ok(result)
}

/// Listet alle Eingabegeraete auf
pub fn list_input_devices() -> AudioResult<Vec<DeviceInfo>> {
    Ok(list_devices()?.into_iter().filter(DeviceInfo::is_input).collect())
}

/// Listet alle Ausgabegeraete auf
pub fn list_output_devices() -> AudioResult<Vec<DeviceInfo>> {
    Ok(list_devices()?.into_iter().filter(DeviceInfo::is_output).collect())
}

/// Gibt das Standard-Eingabegeraet zurueck
pub fn default_input() -> AudioResult<DeviceInfo> {
    cpal::default_host()
        .default_input_device()
        .ok_or(AudioError::KeinStandardEingabegeraet)
        .and_then(|d| device_to_info(&d))
}

/// Gibt das Standard-Ausgabegeraet zurueck
pub fn default_output() -> AudioResult<DeviceInfo> {
    cpal::default_host()
        .default_output_device()
        .ok_or(AudioError::KeinStandardAusgabegeraet)
        .and_then(|d| device_to_info(&d))
}

/// Laedt ein cpal-Eingabegeraet anhand des exakten Namens
pub fn load_cpal_input_device(name: &str) -> AudioResult<Device> {
    let host = cpal::default_host();
    let devices = host
        .input_devices()
        .map_err(|e| AudioError::StreamFehler(e.to_string()))?;
    for device in devices {
        if device.name().is_ok_and(|n| n == name) {
            return Ok(device);
        }
    }
    Err(AudioError::GeraetNichtGefunden(name.to_string()))
}

/// Laedt ein cpal-Ausgabegeraet anhand des exakten Namens
pub fn load_cpal_output_device(name: &str) -> AudioResult<Device> {
    let host = cpal::default_host();
    let devices = host
        .output_devices()
        .map_err(|e| AudioError::StreamFehler(e.to_string()))?;
    for device in devices {
        if device.name().is_ok_and(|n| n == name) {
            return Ok(device);
        }
    }
    Err(AudioError::GeraetNichtGefunden(name.to_string()))
}

// Hilfsfunktion: cpal Device -> DeviceInfo
fn device_to_info(device: &Device) -> AudioResult<DeviceInfo> {
    let name = device
        .name()
        .map_err(|e| AudioError::StreamFehler(e.to_string()))?;

    let max_input_channels = device
        .supported_input_configs()
        .map(|configs| configs.map(|c| c.channels()).max().unwrap_or(0))
        .unwrap_or(0);
    let max_output_channels = device
        .supported_output_configs()
        .map(|configs| configs.map(|c| c.channels()).max().unwrap_or(0))
        .unwrap_or(0);

    Ok(DeviceInfo {
        name,
        max_input_channels,
        max_output_channels,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn geraete() -> Vec<DeviceInfo> {
        vec![
            DeviceInfo {
                name: "USB Mic".into(),
                max_input_channels: 1,
                max_output_channels: 0,
            },
            DeviceInfo {
                name: "Speakers".into(),
                max_input_channels: 0,
                max_output_channels: 2,
            },
        ]
    }

    #[test]
    fn eingabegeraet_exakt_gefunden() {
        let devices = geraete();
        assert_eq!(find_input(&devices, "USB Mic").unwrap().max_input_channels, 1);
        // Teilstring reicht nicht
        assert!(find_input(&devices, "USB").is_err());
    }

    #[test]
    fn ausgabegeraet_ist_kein_eingabegeraet() {
        let devices = geraete();
        assert!(matches!(
            find_input(&devices, "Speakers"),
            Err(AudioError::GeraetNichtGefunden(_))
        ));
        assert!(find_output(&devices, "Speakers").is_ok());
    }

    #[test]
    #[ignore = "Benoetigt Audio-Hardware"]
    fn geraete_auflistbar() {
        let devices = list_devices().expect("Liste sollte abrufbar sein");
        println!(
            "Geraete: {:?}",
            devices.iter().map(|d| &d.name).collect::<Vec<_>>()
        );
    }
}
