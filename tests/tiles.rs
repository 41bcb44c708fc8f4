use cyphercity::tile::decode::{
    ANCHOR_FLAG_SHIFT, ANCHOR_X_SHIFT, ANCHOR_Y_SHIFT, KIND_SHIFT, LEVEL_SHIFT, PART_SHIFT, UPDATED_AT_SHIFT,
};
use cyphercity::tile::*;

fn packed() -> U256 {
    U256::from_u64(1)
        .with_bits(KIND_SHIFT, 8, 7)
        .with_bits(LEVEL_SHIFT, 8, 3)
        .with_bits(UPDATED_AT_SHIFT, 32, 1_700_000_123)
        .with_bits(ANCHOR_FLAG_SHIFT, 1, 1)
        .with_bits(ANCHOR_X_SHIFT, 8, 10)
        .with_bits(ANCHOR_Y_SHIFT, 8, 20)
        .with_bits(PART_SHIFT, 2, 2)
}

#[test]
fn test_decode_v2() {
    let t = decode(&packed(), SchemaVersion::V2);
    assert!(t.exists);
    assert_eq!(t.founder.as_deref(), Some("0x0000000000000000000000000000000000000001"));
    assert_eq!(t.kind, 7);
    assert_eq!(t.tile_kind(), TileKind::HighRiseCommercial);
    assert_eq!(t.level, 3);
    assert_eq!(t.updated_at, 1_700_000_123);
    assert!(t.is_anchor);
    assert_eq!((t.anchor_x, t.anchor_y, t.part), (10, 20, 2));
}

#[test]
fn test_decode_v1_ignores_anchor_fields() {
    let t = decode(&packed(), SchemaVersion::V1);
    assert!(t.exists);
    assert_eq!((t.kind, t.level, t.updated_at), (7, 3, 1_700_000_123));
    assert!(!t.is_anchor);
    assert_eq!((t.anchor_x, t.anchor_y, t.part), (0, 0, 0));
}

#[test]
fn test_decode_zero_is_empty() {
    let t = decode(&U256::ZERO, SchemaVersion::V2);
    assert_eq!(t, TileInfo::EMPTY);
    assert_eq!(t.detail_text(SchemaVersion::V2), "empty");
}

#[test]
fn test_decode_from_hex_word() {
    // kind 5 (road), level 1, founder 0xff
    let u = U256::from_hex_str(&format!("0x0105{}ff", "00".repeat(19))).unwrap();
    let t = decode(&u, SchemaVersion::V2);
    assert_eq!(t.founder.as_deref(), Some("0x00000000000000000000000000000000000000ff"));
    assert_eq!(t.tile_kind(), TileKind::Road);
    assert_eq!(t.level, 1);
}

#[test]
fn test_slot_without_founder_still_exists() {
    // updatedAt alone still marks the slot as occupied
    let u = U256::ZERO.with_bits(UPDATED_AT_SHIFT, 32, 9);
    let t = decode(&u, SchemaVersion::V2);
    assert!(t.exists);
    assert_eq!(t.founder.as_deref(), Some("0x0000000000000000000000000000000000000000"));
}

#[test]
fn test_detail_text_v2() {
    let t = decode(&packed(), SchemaVersion::V2);
    assert_eq!(
        t.detail_text(SchemaVersion::V2),
        "kind=7\nlevel=3\nfounder=0x0000000000000000000000000000000000000001\nupdatedAt=1700000123\n\
         isAnchor=true\nanchor=(10,20)\npart=2"
    );
}

#[test]
fn test_detail_text_v1_has_no_anchor_lines() {
    let t = decode(&packed(), SchemaVersion::V1);
    let text = t.detail_text(SchemaVersion::V1);
    assert_eq!(text.lines().count(), 4);
    assert!(!text.contains("isAnchor"));
}

#[test]
fn test_kind_table() {
    assert_eq!(TileKind::from_u8(0), TileKind::Empty);
    assert_eq!(TileKind::from_u8(5), TileKind::Road);
    assert_eq!(TileKind::from_u8(200), TileKind::Unknown(200));
    assert_eq!(TileKind::Unknown(200).as_u8(), 200);
    assert!(!TileKind::Road.is_building());
    assert!(!TileKind::Empty.is_building());
    for k in TileKind::ALL.into_iter().filter(|k| !matches!(k, TileKind::Empty | TileKind::Road)) {
        assert!(k.is_building(), "{}", k.name());
        assert_eq!(k.footprint(), Footprint::Double);
    }
}

#[test]
fn test_level_clamp() {
    assert_eq!(clamp_level(0), 0);
    assert_eq!(clamp_level(MAX_LEVEL), MAX_LEVEL);
    assert_eq!(clamp_level(200), MAX_LEVEL);
}

#[test]
fn test_founder_formatting_round_trips() {
    let founders = ["01".to_string(), "beef".to_string(), "ff".repeat(20), format!("80{}", "00".repeat(19))];
    for hex in &founders {
        let founder = U256::from_hex_str(&format!("0x{hex}")).unwrap();
        let u = founder.with_bits(KIND_SHIFT, 8, 1);
        let t = decode(&u, SchemaVersion::V2);
        let text = t.founder.unwrap();
        assert_eq!(text.len(), 42);
        assert_eq!(U256::from_hex_str(&text).unwrap(), founder);
        assert_eq!(text, format_address(&founder));
    }
}

#[test]
fn test_decode_is_pure() {
    assert_eq!(decode(&packed(), SchemaVersion::V2), decode(&packed(), SchemaVersion::V2));
}
