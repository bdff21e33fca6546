//! Drag-to-reorder state machine.
//!
//! Pointer and keyboard sensors are just event sources; both feed
//! [`DragEvent`]s through the same transition table.
//!
//! | state          | event                         | next           | action          |
//! |----------------|-------------------------------|----------------|-----------------|
//! | Idle           | Start(id), id present         | Dragging(id)   | -               |
//! | Idle           | anything else                 | Idle           | ignored         |
//! | Dragging(a)    | Over(t)                       | Dragging(a)    | remember t      |
//! | Dragging(a)    | End(Some(b)), b != a, present | Idle           | move a onto b   |
//! | Dragging(a)    | End(None / a / missing)       | Idle           | cancel          |
//! | Dragging(a)    | End(b) after a was removed    | Idle           | cancel          |
//! | Dragging(a)    | Cancel                        | Idle           | cancel          |
//! | Dragging(a)    | Start(_)                      | Dragging(a)    | ignored         |

#![forbid(unsafe_code)]

use ghboard_core::ItemId;

use crate::order::OrderState;
use crate::window::Rect;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DragState {
    #[default]
    Idle,
    Dragging { active_id: ItemId, over_id: Option<ItemId> },
}

impl DragState {
    pub fn active_id(&self) -> Option<&str> {
        match self {
            DragState::Idle => None,
            DragState::Dragging { active_id, .. } => Some(active_id.as_str()),
        }
    }

    pub fn over_id(&self) -> Option<&str> {
        match self {
            DragState::Idle => None,
            DragState::Dragging { over_id, .. } => over_id.as_deref(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DragEvent {
    Start(ItemId),
    Over(Option<ItemId>),
    End(Option<ItemId>),
    Cancel,
}

/// Side effect requested by a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DragAction {
    None,
    Move { source: ItemId, target: ItemId },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DragOutcome {
    Started,
    Hovering,
    Moved { from: usize, to: usize },
    Cancelled,
    Ignored,
}

/// Pure transition function. `order` is consulted only to validate ids.
pub fn transition(state: &DragState, event: &DragEvent, order: &OrderState) -> (DragState, DragAction, DragOutcome) {
    match (state, event) {
        (DragState::Idle, DragEvent::Start(id)) if order.contains(id) => (
            DragState::Dragging { active_id: id.clone(), over_id: None },
            DragAction::None,
            DragOutcome::Started,
        ),
        (DragState::Idle, _) => (DragState::Idle, DragAction::None, DragOutcome::Ignored),
        (DragState::Dragging { active_id, .. }, DragEvent::Over(over)) => (
            DragState::Dragging { active_id: active_id.clone(), over_id: over.clone() },
            DragAction::None,
            DragOutcome::Hovering,
        ),
        (DragState::Dragging { active_id, .. }, DragEvent::End(Some(target))) if target != active_id => {
            match (order.position(active_id), order.position(target)) {
                (Some(from), Some(to)) => (
                    DragState::Idle,
                    DragAction::Move { source: active_id.clone(), target: target.clone() },
                    DragOutcome::Moved { from, to },
                ),
                _ => (DragState::Idle, DragAction::None, DragOutcome::Cancelled),
            }
        }
        (DragState::Dragging { .. }, DragEvent::End(_)) | (DragState::Dragging { .. }, DragEvent::Cancel) => {
            (DragState::Idle, DragAction::None, DragOutcome::Cancelled)
        }
        (DragState::Dragging { .. }, DragEvent::Start(_)) => (state.clone(), DragAction::None, DragOutcome::Ignored),
    }
}

/// Holds the current drag transaction and applies transitions to an order.
#[derive(Debug, Clone, Default)]
pub struct DragMachine {
    state: DragState,
}

impl DragMachine {
    pub fn new() -> Self { Self::default() }

    pub fn state(&self) -> &DragState { &self.state }
    pub fn active_id(&self) -> Option<&str> { self.state.active_id() }
    pub fn is_dragging(&self) -> bool { self.state.active_id().is_some() }

    pub fn handle(&mut self, event: DragEvent, order: &mut OrderState) -> DragOutcome {
        let (next, action, outcome) = transition(&self.state, &event, order);
        self.state = next;
        match action {
            DragAction::None => outcome,
            DragAction::Move { source, target } => match order.move_item(&source, &target) {
                Some(_) => outcome,
                None => DragOutcome::Cancelled,
            },
        }
    }
}

/// Pointer collision: the candidate whose center is nearest to `(x, y)`.
/// Ties go to the earlier candidate.
pub fn closest_target<'a, I>(x: f32, y: f32, candidates: I) -> Option<&'a str>
where
    I: IntoIterator<Item = (&'a str, Rect)>,
{
    let mut best: Option<(&'a str, f32)> = None;
    for (id, rect) in candidates {
        let d = rect.distance_sq(x, y);
        match best {
            Some((_, bd)) if bd <= d => {}
            _ => best = Some((id, d)),
        }
    }
    best.map(|(id, _)| id)
}

/// Keyboard sensor step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyStep {
    Up,
    Down,
    Left,
    Right,
}

/// Keyboard collision: the id one step away from `active` in a row-major
/// layout of `columns` columns, if that slot exists.
pub fn keyboard_target<'a>(order: &'a OrderState, active: &str, step: KeyStep, columns: usize) -> Option<&'a str> {
    let columns = columns.max(1);
    let at = order.position(active)?;
    let next = match step {
        KeyStep::Up => at.checked_sub(columns)?,
        KeyStep::Down => at + columns,
        KeyStep::Left => at.checked_sub(1)?,
        KeyStep::Right => at + 1,
    };
    order.ids().get(next).map(|s| s.as_str())
}
