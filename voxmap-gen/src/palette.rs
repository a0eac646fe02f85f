//! Top-down map colors for surface blocks.

use voxmap_core::FillColor;

/// Color for blocks missing from the table.
pub const UNKNOWN_BLOCK_COLOR: &str = "rgb(211, 211, 211)";

const BLOCK_COLORS: &[(&str, &str)] = &[
    ("minecraft:grass_block", "rgb(127,178,56)"),
    ("minecraft:dirt", "rgb(151,109,77)"),
    ("minecraft:stone", "rgb(112,112,112)"),
    ("minecraft:bedrock", "rgb(64,64,64)"),
    ("minecraft:sand", "rgb(247,233,163)"),
    ("minecraft:water", "rgb(64,64,255)"),
    ("minecraft:snow_block", "rgb(255,255,255)"),
    ("minecraft:oak_leaves", "rgb(0,124,0)"),
];

pub fn block_color(name: &str) -> FillColor {
    let raw = BLOCK_COLORS
        .iter()
        .find(|(block, _)| *block == name)
        .map_or(UNKNOWN_BLOCK_COLOR, |(_, color)| *color);
    FillColor::new(raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_and_unknown_blocks() {
        assert_eq!(block_color("minecraft:stone").as_str(), "rgb(112,112,112)");
        assert_eq!(block_color("minecraft:beacon").as_str(), UNKNOWN_BLOCK_COLOR);
        // every entry must survive the shading parser
        for (_, color) in BLOCK_COLORS {
            assert!(FillColor::new(*color).parse_rgb().is_ok(), "{color}");
        }
    }
}
