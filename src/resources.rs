//! Bundled packet maps and startup sequences
//!
//! The registry is built once at startup and shared by reference. Nothing
//! here is global; tests build their own registry.

use crate::capture::lines::parse_capture_lines;
use crate::core::error::{PanelError, PanelResult};
use crate::hid::template::PacketTemplate;
use crate::mcdu::upload::{FontPacketMap, PalettePacketMap};
use std::collections::BTreeMap;
use tracing::debug;

const PACKET_MAP_29: &str = include_str!("../resources/packet-map-29.json");
const PACKET_MAP_31: &str = include_str!("../resources/packet-map-31.json");
const PALETTE_MAP: &str = include_str!("../resources/palette-map.json");
const MCDU_STARTUP: &str = include_str!("../resources/mcdu-startup.hex");
const FCU_STARTUP: &str = include_str!("../resources/fcu-startup.hex");

fn resource_error(name: &str, reason: impl ToString) -> PanelError {
    PanelError::Resource {
        name: name.to_string(),
        reason: reason.to_string(),
    }
}

fn parse_startup(name: &str, text: &str) -> PanelResult<Vec<Vec<u8>>> {
    parse_capture_lines(text.lines()).map_err(|e| resource_error(name, e))
}

/// Packet templates and literal sequences, keyed by what they drive
#[derive(Debug, Clone)]
pub struct ResourceRegistry {
    font_maps: BTreeMap<u16, FontPacketMap>,
    font_templates: BTreeMap<u16, PacketTemplate>,
    palette_template: PacketTemplate,
    mcdu_startup: Vec<Vec<u8>>,
    fcu_startup: Vec<Vec<u8>>,
}

impl ResourceRegistry {
    /// Parse every bundled resource
    pub fn load() -> PanelResult<Self> {
        let palette_map = PalettePacketMap::from_json(PALETTE_MAP)
            .map_err(|e| resource_error("palette-map.json", e))?;

        let mut registry = Self {
            font_maps: BTreeMap::new(),
            font_templates: BTreeMap::new(),
            palette_template: palette_map.build()?,
            mcdu_startup: parse_startup("mcdu-startup.hex", MCDU_STARTUP)?,
            fcu_startup: parse_startup("fcu-startup.hex", FCU_STARTUP)?,
        };
        for (name, json) in [
            ("packet-map-29.json", PACKET_MAP_29),
            ("packet-map-31.json", PACKET_MAP_31),
        ] {
            let map = FontPacketMap::from_json(json).map_err(|e| resource_error(name, e))?;
            registry.add_font_map(map)?;
        }
        Ok(registry)
    }

    /// Register a font packet map, replacing any for the same glyph height
    pub fn add_font_map(&mut self, map: FontPacketMap) -> PanelResult<()> {
        let template = map.build()?;
        debug!(
            "Font packet map {} ({}x{}): {} reports",
            map.name,
            map.glyph_width,
            map.glyph_height,
            template.packets.len()
        );
        self.font_templates.insert(map.glyph_height, template);
        self.font_maps.insert(map.glyph_height, map);
        Ok(())
    }

    pub fn supported_glyph_heights(&self) -> impl Iterator<Item = u16> + '_ {
        self.font_templates.keys().copied()
    }

    /// Font upload template for a glyph height
    pub fn font_template(&self, glyph_height: u16) -> Option<&PacketTemplate> {
        self.font_templates.get(&glyph_height)
    }

    pub fn font_map(&self, glyph_height: u16) -> Option<&FontPacketMap> {
        self.font_maps.get(&glyph_height)
    }

    pub fn palette_template(&self) -> &PacketTemplate {
        &self.palette_template
    }

    /// MCDU power-on reports, replayed unmodified
    pub fn mcdu_startup(&self) -> &[Vec<u8>] {
        &self.mcdu_startup
    }

    /// FCU power-on reports, replayed unmodified
    pub fn fcu_startup(&self) -> &[Vec<u8>] {
        &self.fcu_startup
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hid::protocol::{classify_upload, UploadKind, PACKET_SIZE};
    use crate::hid::template::HoleTarget;

    #[test]
    fn test_bundled_resources_load() {
        let registry = ResourceRegistry::load().unwrap();
        assert_eq!(registry.supported_glyph_heights().collect::<Vec<_>>(), vec![29, 31]);
        assert_eq!(registry.mcdu_startup().len(), 5);
        assert_eq!(registry.mcdu_startup()[4].len(), 14);
        assert!(!registry.fcu_startup().is_empty());
    }

    #[test]
    fn test_font_templates_are_well_formed() {
        let registry = ResourceRegistry::load().unwrap();
        for height in [29, 31] {
            let template = registry.font_template(height).unwrap();
            assert_eq!(template.glyph_height, height);
            assert!(template.packets.iter().all(|p| p.len() == PACKET_SIZE));
            assert!(template.hole(&HoleTarget::LargeGlyph('A')).is_some());
            assert!(template.hole(&HoleTarget::SmallGlyph('\u{2190}')).is_some());

            let stream_reports = template
                .packets
                .iter()
                .filter(|p| !matches!(classify_upload(p), Some(UploadKind::Continue)))
                .count();
            assert_eq!(stream_reports % 4, 0);
        }
    }

    #[test]
    fn test_palette_template_has_every_slot() {
        let registry = ResourceRegistry::load().unwrap();
        let template = registry.palette_template();
        for slot in 0..crate::model::PALETTE_SLOTS {
            assert_eq!(
                template.hole(&HoleTarget::Foreground(slot)).map(|h| h.len()),
                Some(4)
            );
        }
    }
}
