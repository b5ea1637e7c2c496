use serde::{Deserialize, Serialize};

use crate::render::CardKey;

/// Minimum distance kept between the popover and the viewport edges.
pub const VIEWPORT_MARGIN: f64 = 12.0;
/// Vertical gap between the anchor's bottom edge and the popover.
pub const ANCHOR_GAP: f64 = 8.0;

/// Viewport-relative rectangle, as measured by the presentation surface.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub left: f64,
    pub top: f64,
}

/// Place the popover below `anchor`, centred on it and clamped horizontally
/// so it stays `VIEWPORT_MARGIN` inside the viewport. When the popover is
/// wider than the viewport allows, the left margin wins.
pub fn position_below(anchor: Rect, popover: Size, viewport: Size) -> Position {
    let centred = anchor.x + anchor.width / 2.0 - popover.width / 2.0;
    let max_left = viewport.width - popover.width - VIEWPORT_MARGIN;
    let left = centred.min(max_left).max(VIEWPORT_MARGIN);
    Position {
        left,
        top: anchor.y + anchor.height + ANCHOR_GAP,
    }
}

/// Geometry needed to place the popover, reported on open and on every
/// scroll or resize.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Placement {
    pub anchor: Rect,
    pub popover: Size,
    pub viewport: Size,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct OpenPopover {
    anchor: CardKey,
    position: Position,
}

/// At most one detail popover, attached to a rendered card.
#[derive(Debug, Default)]
pub struct DetailPopover {
    open: Option<OpenPopover>,
}

impl DetailPopover {
    /// Open for `anchor`. Any popover already open is replaced.
    pub fn open(&mut self, anchor: CardKey, placement: Placement) {
        self.open = Some(OpenPopover {
            anchor,
            position: position_below(placement.anchor, placement.popover, placement.viewport),
        });
    }

    pub fn close(&mut self) {
        self.open = None;
    }

    pub fn anchor(&self) -> Option<CardKey> {
        self.open.map(|open| open.anchor)
    }

    pub fn position(&self) -> Option<Position> {
        self.open.map(|open| open.position)
    }

    /// Recompute the position after a scroll or resize. No-op when closed.
    pub fn reposition(&mut self, placement: Placement) {
        if let Some(open) = self.open.as_mut() {
            open.position = position_below(placement.anchor, placement.popover, placement.viewport);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VIEWPORT: Size = Size { width: 800.0, height: 600.0 };
    const POPOVER: Size = Size { width: 200.0, height: 120.0 };

    fn anchor_at(x: f64) -> Rect {
        Rect { x, y: 100.0, width: 100.0, height: 40.0 }
    }

    #[test]
    fn centred_below_the_anchor() {
        let pos = position_below(anchor_at(300.0), POPOVER, VIEWPORT);
        assert_eq!(pos, Position { left: 250.0, top: 148.0 });
    }

    #[test]
    fn clamped_to_the_left_margin() {
        let pos = position_below(anchor_at(0.0), POPOVER, VIEWPORT);
        assert_eq!(pos.left, VIEWPORT_MARGIN);
    }

    #[test]
    fn clamped_to_the_right_margin() {
        let pos = position_below(anchor_at(750.0), POPOVER, VIEWPORT);
        assert_eq!(pos.left, 800.0 - 200.0 - VIEWPORT_MARGIN);
    }

    #[test]
    fn narrow_viewport_keeps_the_left_margin() {
        let pos = position_below(anchor_at(10.0), POPOVER, Size { width: 150.0, height: 600.0 });
        assert_eq!(pos.left, VIEWPORT_MARGIN);
    }

    #[test]
    fn opening_again_replaces_and_reposition_follows_the_anchor() {
        let mut popover = DetailPopover::default();
        let first = CardKey { generation: 1, index: 0 };
        let second = CardKey { generation: 1, index: 3 };
        let placement = Placement { anchor: anchor_at(300.0), popover: POPOVER, viewport: VIEWPORT };
        popover.open(first, placement);
        popover.open(second, placement);
        assert_eq!(popover.anchor(), Some(second));

        let scrolled = Placement {
            anchor: Rect { y: 20.0, ..anchor_at(300.0) },
            ..placement
        };
        popover.reposition(scrolled);
        assert_eq!(popover.position().map(|p| p.top), Some(68.0));

        popover.close();
        popover.reposition(placement);
        assert_eq!(popover.anchor(), None);
        assert_eq!(popover.position(), None);
    }
}
