//! Touch gesture geometry and W3C pointer sequences
//!
//! A [`GesturePlan`] is a pure description of one drag from a start point to
//! an end point. Android executes it as a W3C pointer action sequence, iOS as
//! the `mobile: dragFromToForDuration` script.

use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::session::{ElementId, W3C_ELEMENT_KEY};

/// Hold before the finger starts moving
pub const PRESS_PAUSE_MS: u64 = 200;
/// Duration of the pointer move on Android
pub const MOVE_DURATION_MS: u64 = 1000;
/// Duration of the drag on iOS, in seconds
pub const IOS_DRAG_DURATION_SECS: f64 = 1.0;

// ----------------------------------------------------------------------------
// Geometry
// ----------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: i64,
    pub y: i64,
}

impl Point {
    pub fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: i64,
    pub height: i64,
}

impl Size {
    pub fn new(width: i64, height: i64) -> Self {
        Self { width, height }
    }

    /// `percent` of the height, truncated like integer pixel math
    pub fn height_pct(&self, percent: i64) -> i64 {
        self.height * percent / 100
    }

    pub fn width_pct(&self, percent: i64) -> i64 {
        self.width * percent / 100
    }
}

/// Element bounds as reported by the element rect command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: i64,
    pub y: i64,
    pub width: i64,
    pub height: i64,
}

impl Rect {
    pub fn new(x: i64, y: i64, width: i64, height: i64) -> Self {
        Self { x, y, width, height }
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2, self.y + self.height / 2)
    }

    pub fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScrollDirection {
    Up,
    Down,
}

/// Direction the finger travels across the screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SwipeDirection {
    Left,
    Right,
    Up,
    Down,
}

impl std::str::FromStr for SwipeDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "left" => Ok(SwipeDirection::Left),
            "right" => Ok(SwipeDirection::Right),
            "up" => Ok(SwipeDirection::Up),
            "down" => Ok(SwipeDirection::Down),
            other => Err(format!("unknown swipe direction '{other}'")),
        }
    }
}

// ----------------------------------------------------------------------------
// Plans
// ----------------------------------------------------------------------------

/// One drag from `from` to `to`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GesturePlan {
    pub from: Point,
    pub to: Point,
}

impl GesturePlan {
    pub fn drag(from: Point, to: Point) -> Self {
        Self { from, to }
    }

    /// Scroll starting at the element centre; ends at 30 % (up) or 70 % (down)
    /// of the screen height
    pub fn scroll(element: Rect, screen: Size, direction: ScrollDirection) -> Self {
        let from = element.center();
        let end_y = match direction {
            ScrollDirection::Up => screen.height_pct(30),
            ScrollDirection::Down => screen.height_pct(70),
        };
        Self::drag(from, Point::new(from.x, end_y))
    }

    /// Scroll the element up by `percent` of the screen height
    ///
    /// The end point never leaves the screen.
    pub fn scroll_by(element: Rect, screen: Size, percent: u32) -> Self {
        let from = element.center();
        let end_y = (from.y - screen.height_pct(i64::from(percent))).max(0);
        Self::drag(from, Point::new(from.x, end_y))
    }

    /// Drag the element centre up by `percent` of its own distance from the top
    pub fn lift(element: Rect, percent: u32) -> Self {
        let from = element.center();
        let end_y = from.y - from.y * i64::from(percent) / 100;
        Self::drag(from, Point::new(from.x, end_y.max(0)))
    }

    /// Full-screen swipe from 80 % to 20 % along the travel axis, centred on
    /// the other axis
    pub fn swipe(screen: Size, direction: SwipeDirection) -> Self {
        let cx = screen.width_pct(50);
        let cy = screen.height_pct(50);
        let (near_x, far_x) = (screen.width_pct(20), screen.width_pct(80));
        let (near_y, far_y) = (screen.height_pct(20), screen.height_pct(80));

        match direction {
            SwipeDirection::Left => Self::drag(Point::new(far_x, cy), Point::new(near_x, cy)),
            SwipeDirection::Right => Self::drag(Point::new(near_x, cy), Point::new(far_x, cy)),
            SwipeDirection::Up => Self::drag(Point::new(cx, far_y), Point::new(cx, near_y)),
            SwipeDirection::Down => Self::drag(Point::new(cx, near_y), Point::new(cx, far_y)),
        }
    }

    /// Android: move(0) → down → pause(200 ms) → move(1000 ms) → up
    pub fn to_pointer_sequence(&self) -> PointerSequence {
        PointerSequence::touch("finger")
            .action(PointerAction::mv(0, self.from, PointerOrigin::Viewport))
            .action(PointerAction::Down { button: 0 })
            .action(PointerAction::Pause { duration: PRESS_PAUSE_MS })
            .action(PointerAction::mv(MOVE_DURATION_MS, self.to, PointerOrigin::Viewport))
            .action(PointerAction::Up { button: 0 })
    }

    /// iOS: arguments of `mobile: dragFromToForDuration`
    pub fn to_ios_drag_args(&self) -> Value {
        json!({
            "duration": IOS_DRAG_DURATION_SECS,
            "fromX": self.from.x,
            "fromY": self.from.y,
            "toX": self.to.x,
            "toY": self.to.y,
        })
    }
}

// ----------------------------------------------------------------------------
// W3C pointer actions
// ----------------------------------------------------------------------------

/// Reference frame of a pointer move
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PointerOrigin {
    Viewport,
    Element(ElementId),
}

impl Serialize for PointerOrigin {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            PointerOrigin::Viewport => serializer.serialize_str("viewport"),
            PointerOrigin::Element(element) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry(W3C_ELEMENT_KEY, element.as_str())?;
                map.end()
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type")]
pub enum PointerAction {
    #[serde(rename = "pointerMove")]
    Move {
        duration: u64,
        x: i64,
        y: i64,
        origin: PointerOrigin,
    },
    #[serde(rename = "pointerDown")]
    Down { button: u8 },
    #[serde(rename = "pause")]
    Pause { duration: u64 },
    #[serde(rename = "pointerUp")]
    Up { button: u8 },
}

impl PointerAction {
    pub fn mv(duration: u64, to: Point, origin: PointerOrigin) -> Self {
        PointerAction::Move {
            duration,
            x: to.x,
            y: to.y,
            origin,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PointerParameters {
    #[serde(rename = "pointerType")]
    pub pointer_type: String,
}

/// One input source with its ordered actions
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PointerSequence {
    #[serde(rename = "type")]
    pub kind: String,
    pub id: String,
    pub parameters: PointerParameters,
    pub actions: Vec<PointerAction>,
}

impl PointerSequence {
    pub fn touch(id: impl Into<String>) -> Self {
        Self {
            kind: "pointer".to_string(),
            id: id.into(),
            parameters: PointerParameters {
                pointer_type: "touch".to_string(),
            },
            actions: Vec::new(),
        }
    }

    pub fn action(mut self, action: PointerAction) -> Self {
        self.actions.push(action);
        self
    }

    /// Move onto the element centre and tap it
    pub fn tap_element(element: &ElementId) -> Self {
        Self::touch("finger")
            .action(PointerAction::mv(0, Point::default(), PointerOrigin::Element(element.clone())))
            .action(PointerAction::Down { button: 0 })
            .action(PointerAction::Pause { duration: 50 })
            .action(PointerAction::Up { button: 0 })
    }

    /// Action kinds in order, e.g. `["pointerMove", "pointerDown", ..]`
    pub fn kinds(&self) -> Vec<&'static str> {
        self.actions
            .iter()
            .map(|action| match action {
                PointerAction::Move { .. } => "pointerMove",
                PointerAction::Down { .. } => "pointerDown",
                PointerAction::Pause { .. } => "pause",
                PointerAction::Up { .. } => "pointerUp",
            })
            .collect()
    }
}
