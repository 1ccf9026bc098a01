//! Board items that take part in connectivity
//!
//! Pads, vias, tracks and filled zones are the only copper objects the
//! ratsnest engine knows about. Footprints (modules) only group pads.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use super::geometry::{ring_boundary_contains, ring_contains, BBox, Point};
use super::layers::LayerSet;

/// Net code 0 means "not connected to any net"
pub const UNCONNECTED_NET: u32 = 0;

/// Pad outline used for hit-testing nearby copper
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PadShape {
    Circle { radius: i32 },
    Rect { width: i32, height: i32 },
    /// Stadium: a rectangle with fully rounded short ends
    Oval { width: i32, height: i32 },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pad {
    pub id: u64,
    pub net_code: u32,
    pub position: Point,
    pub layers: LayerSet,
    pub shape: PadShape,
}

impl Pad {
    /// True when `p` lies on or inside the pad outline
    pub fn hit_test(&self, p: Point) -> bool {
        let dx = i64::from(p.x) - i64::from(self.position.x);
        let dy = i64::from(p.y) - i64::from(self.position.y);

        match self.shape {
            PadShape::Circle { radius } => {
                let r = i64::from(radius);
                (dx as i128).pow(2) + (dy as i128).pow(2) <= (r as i128).pow(2)
            }
            PadShape::Rect { width, height } => {
                2 * dx.abs() <= i64::from(width) && 2 * dy.abs() <= i64::from(height)
            }
            PadShape::Oval { width, height } => {
                // Work along the long axis
                let (along, across, long, short) = if width >= height {
                    (dx, dy, i64::from(width), i64::from(height))
                } else {
                    (dy, dx, i64::from(height), i64::from(width))
                };
                let half_len = (long - short) / 2;
                let off = along - along.clamp(-half_len, half_len);
                let r = short / 2;
                (off as i128).pow(2) + (across as i128).pow(2) <= (r as i128).pow(2)
            }
        }
    }

    pub fn bbox(&self) -> BBox {
        let (hw, hh) = match self.shape {
            PadShape::Circle { radius } => (radius, radius),
            PadShape::Rect { width, height } | PadShape::Oval { width, height } => {
                (width / 2 + width % 2, height / 2 + height % 2)
            }
        };
        BBox::around(self.position, hw, hh)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Via {
    pub id: u64,
    pub net_code: u32,
    pub position: Point,
    pub layers: LayerSet,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Track {
    pub id: u64,
    pub net_code: u32,
    pub start: Point,
    pub end: Point,
    pub width: i32,
    pub layer: u8,
}

impl Track {
    pub fn layers(&self) -> LayerSet {
        LayerSet::single(self.layer)
    }
}

/// One filled outline of a zone, with optional holes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZonePolygon {
    pub outline: Vec<Point>,
    #[serde(default)]
    pub holes: Vec<Vec<Point>>,
}

impl ZonePolygon {
    /// Inside the outline and outside every hole; both boundaries count as copper
    pub fn contains(&self, p: Point) -> bool {
        if !ring_contains(&self.outline, p) {
            return false;
        }
        !self
            .holes
            .iter()
            .any(|hole| ring_contains(hole, p) && !ring_boundary_contains(hole, p))
    }

    pub fn bbox(&self) -> Option<BBox> {
        BBox::from_points(&self.outline)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Zone {
    pub id: u64,
    pub net_code: u32,
    pub layers: LayerSet,
    #[serde(default)]
    pub filled_polygons: Vec<ZonePolygon>,
}

/// Footprint: a group of pads placed together
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Module {
    pub id: u64,
    #[serde(default)]
    pub reference: String,
    #[serde(default)]
    pub pads: Vec<Pad>,
}

/// Kind of a tracked connectivity item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    Pad,
    Via,
    Track,
    Zone,
}

/// Lightweight handle to a board item, returned by connectivity queries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ItemRef {
    pub kind: ItemKind,
    pub id: u64,
}

impl ItemRef {
    pub const fn new(kind: ItemKind, id: u64) -> Self {
        Self { kind, id }
    }
}

bitflags! {
    /// Item kind mask for bulk queries
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ItemTypes: u8 {
        const PADS = 0b0001;
        const VIAS = 0b0010;
        const TRACKS = 0b0100;
        const ZONES = 0b1000;
        const ALL = Self::PADS.bits() | Self::VIAS.bits() | Self::TRACKS.bits() | Self::ZONES.bits();
    }
}

impl ItemTypes {
    pub fn includes(self, kind: ItemKind) -> bool {
        let flag = match kind {
            ItemKind::Pad => ItemTypes::PADS,
            ItemKind::Via => ItemTypes::VIAS,
            ItemKind::Track => ItemTypes::TRACKS,
            ItemKind::Zone => ItemTypes::ZONES,
        };
        self.contains(flag)
    }
}

/// Borrowed board item handed to the ratsnest engine
#[derive(Debug, Clone, Copy)]
pub enum BoardItem<'a> {
    Pad(&'a Pad),
    Via(&'a Via),
    Track(&'a Track),
    Zone(&'a Zone),
    Module(&'a Module),
}

impl<'a> BoardItem<'a> {
    /// Net code of a connected item, `None` for modules
    pub fn net_code(&self) -> Option<u32> {
        match self {
            BoardItem::Pad(p) => Some(p.net_code),
            BoardItem::Via(v) => Some(v.net_code),
            BoardItem::Track(t) => Some(t.net_code),
            BoardItem::Zone(z) => Some(z.net_code),
            BoardItem::Module(_) => None,
        }
    }

    /// Handle of a connected item, `None` for modules
    pub fn item_ref(&self) -> Option<ItemRef> {
        match self {
            BoardItem::Pad(p) => Some(ItemRef::new(ItemKind::Pad, p.id)),
            BoardItem::Via(v) => Some(ItemRef::new(ItemKind::Via, v.id)),
            BoardItem::Track(t) => Some(ItemRef::new(ItemKind::Track, t.id)),
            BoardItem::Zone(z) => Some(ItemRef::new(ItemKind::Zone, z.id)),
            BoardItem::Module(_) => None,
        }
    }
}

impl<'a> From<&'a Pad> for BoardItem<'a> {
    fn from(pad: &'a Pad) -> Self {
        BoardItem::Pad(pad)
    }
}

impl<'a> From<&'a Via> for BoardItem<'a> {
    fn from(via: &'a Via) -> Self {
        BoardItem::Via(via)
    }
}

impl<'a> From<&'a Track> for BoardItem<'a> {
    fn from(track: &'a Track) -> Self {
        BoardItem::Track(track)
    }
}

impl<'a> From<&'a Zone> for BoardItem<'a> {
    fn from(zone: &'a Zone) -> Self {
        BoardItem::Zone(zone)
    }
}

impl<'a> From<&'a Module> for BoardItem<'a> {
    fn from(module: &'a Module) -> Self {
        BoardItem::Module(module)
    }
}

/// The board's current copper item set
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Board {
    /// Number of nets including net 0
    pub net_count: u32,
    #[serde(default)]
    pub modules: Vec<Module>,
    #[serde(default)]
    pub tracks: Vec<Track>,
    #[serde(default)]
    pub vias: Vec<Via>,
    #[serde(default)]
    pub zones: Vec<Zone>,
}

impl Board {
    pub fn pads(&self) -> impl Iterator<Item = &Pad> {
        self.modules.iter().flat_map(|m| m.pads.iter())
    }
}
