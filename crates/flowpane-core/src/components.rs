//! Diagram shapes and the collection reducer.
//!
//! [`ShapeCollection`] is an ordered list of [`Shape`]s (back to front).
//! Every change goes through a [`ComponentAction`]; [`ShapeCollection::apply`]
//! is a pure `(collection, action) -> collection` function and
//! [`ShapeCollection::dispatch`] applies it in place. Actions naming an
//! unknown id are no-ops.

use kurbo::{Point, Rect, Size};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a shape.
pub type ShapeId = Uuid;

/// The kind of a shape. Fixed at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShapeKind {
    Rectangle,
    Circle,
}

/// A diagram shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shape {
    pub(crate) id: ShapeId,
    kind: ShapeKind,
    /// Top-left corner in diagram space.
    pub position: Point,
    pub width: f64,
    pub height: f64,
    /// Rotation in degrees. Rendered, but hit-testing uses the unrotated bounds.
    pub rotation_degrees: f64,
    /// Ids of connected shapes. Carried but not yet drawn.
    pub connections: Vec<ShapeId>,
}

impl Shape {
    /// Default width and height for new shapes.
    pub const DEFAULT_SIZE: f64 = 10.0;

    /// Create a shape with a fresh id.
    pub fn new(kind: ShapeKind, position: Point, width: f64, height: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            position,
            width: width.max(0.0),
            height: height.max(0.0),
            rotation_degrees: 0.0,
            connections: Vec::new(),
        }
    }

    /// Create a rectangle.
    pub fn rectangle(position: Point, width: f64, height: f64) -> Self {
        Self::new(ShapeKind::Rectangle, position, width, height)
    }

    /// Create a circle.
    pub fn circle(position: Point, width: f64, height: f64) -> Self {
        Self::new(ShapeKind::Circle, position, width, height)
    }

    pub fn id(&self) -> ShapeId {
        self.id
    }

    pub fn kind(&self) -> ShapeKind {
        self.kind
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// Axis-aligned bounds in diagram space (rotation ignored).
    pub fn bounds(&self) -> Rect {
        Rect::from_origin_size(self.position, self.size())
    }

    fn clamp_size(&mut self) {
        self.width = self.width.max(0.0);
        self.height = self.height.max(0.0);
    }
}

impl Default for Shape {
    fn default() -> Self {
        Self::rectangle(Point::ZERO, Self::DEFAULT_SIZE, Self::DEFAULT_SIZE)
    }
}

/// Partial update for a shape. Absent fields are left untouched.
///
/// There is no id or kind field; neither can change after creation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShapePatch {
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub rotation_degrees: Option<f64>,
    pub connections: Option<Vec<ShapeId>>,
}

impl ShapePatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_x(mut self, x: f64) -> Self {
        self.x = Some(x);
        self
    }

    pub fn with_y(mut self, y: f64) -> Self {
        self.y = Some(y);
        self
    }

    pub fn with_position(self, position: Point) -> Self {
        self.with_x(position.x).with_y(position.y)
    }

    pub fn with_width(mut self, width: f64) -> Self {
        self.width = Some(width);
        self
    }

    pub fn with_height(mut self, height: f64) -> Self {
        self.height = Some(height);
        self
    }

    pub fn with_size(self, size: Size) -> Self {
        self.with_width(size.width).with_height(size.height)
    }

    pub fn with_rotation(mut self, degrees: f64) -> Self {
        self.rotation_degrees = Some(degrees);
        self
    }

    pub fn with_connections(mut self, connections: Vec<ShapeId>) -> Self {
        self.connections = Some(connections);
        self
    }

    /// Shallow-merge the present fields into `shape`.
    fn merge_into(self, shape: &mut Shape) {
        if let Some(x) = self.x {
            shape.position.x = x;
        }
        if let Some(y) = self.y {
            shape.position.y = y;
        }
        if let Some(width) = self.width {
            shape.width = width;
        }
        if let Some(height) = self.height {
            shape.height = height;
        }
        if let Some(degrees) = self.rotation_degrees {
            shape.rotation_degrees = degrees;
        }
        if let Some(connections) = self.connections {
            shape.connections = connections;
        }
    }
}

/// Structural mutations of a [`ShapeCollection`].
///
/// `set: true` assigns the payload, `set: false` adds it to the current value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ComponentAction {
    /// Append a shape.
    Add(Shape),
    /// Delete a shape.
    Remove(ShapeId),
    /// Merge fields into a shape.
    Modify { id: ShapeId, patch: ShapePatch },
    /// Position update.
    Move { id: ShapeId, dx: f64, dy: f64, set: bool },
    /// Size update.
    Resize { id: ShapeId, dw: f64, dh: f64, set: bool },
    /// Rotation update, in degrees.
    Rotate { id: ShapeId, dr: f64, set: bool },
}

impl ComponentAction {
    /// Move a shape's top-left corner to `position`.
    pub fn move_to(id: ShapeId, position: Point) -> Self {
        Self::Move { id, dx: position.x, dy: position.y, set: true }
    }

    /// Move a shape by a delta.
    pub fn move_by(id: ShapeId, dx: f64, dy: f64) -> Self {
        Self::Move { id, dx, dy, set: false }
    }

    /// Set a shape's size.
    pub fn resize_to(id: ShapeId, size: Size) -> Self {
        Self::Resize { id, dw: size.width, dh: size.height, set: true }
    }

    /// Grow or shrink a shape.
    pub fn resize_by(id: ShapeId, dw: f64, dh: f64) -> Self {
        Self::Resize { id, dw, dh, set: false }
    }

    /// Set a shape's rotation.
    pub fn rotate_to(id: ShapeId, degrees: f64) -> Self {
        Self::Rotate { id, dr: degrees, set: true }
    }

    /// Rotate a shape by a delta.
    pub fn rotate_by(id: ShapeId, degrees: f64) -> Self {
        Self::Rotate { id, dr: degrees, set: false }
    }
}

fn set_or_add(current: f64, value: f64, set: bool) -> f64 {
    if set { value } else { current + value }
}

/// Ordered shape list; order is z-order and adjacency.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShapeCollection {
    shapes: Vec<Shape>,
}

impl ShapeCollection {
    /// Create an empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a collection by adding shapes in order. Duplicate ids are dropped.
    pub fn from_shapes(shapes: impl IntoIterator<Item = Shape>) -> Self {
        shapes
            .into_iter()
            .fold(Self::new(), |collection, shape| collection.apply(ComponentAction::Add(shape)))
    }

    /// Apply one action and return the resulting collection.
    pub fn apply(mut self, action: ComponentAction) -> Self {
        self.dispatch(action);
        self
    }

    /// Apply one action in place.
    pub fn dispatch(&mut self, action: ComponentAction) {
        log::trace!("component dispatch: {:?}", action);
        match action {
            ComponentAction::Add(shape) => {
                if self.contains(shape.id) {
                    log::warn!("Ignoring add of duplicate shape id {}", shape.id);
                    return;
                }
                self.shapes.push(shape);
            }
            ComponentAction::Remove(id) => {
                self.shapes.retain(|shape| shape.id != id);
            }
            ComponentAction::Modify { id, patch } => {
                self.modify(id, |shape| patch.merge_into(shape));
            }
            ComponentAction::Move { id, dx, dy, set } => {
                self.modify(id, |shape| {
                    shape.position.x = set_or_add(shape.position.x, dx, set);
                    shape.position.y = set_or_add(shape.position.y, dy, set);
                });
            }
            ComponentAction::Resize { id, dw, dh, set } => {
                self.modify(id, |shape| {
                    shape.width = set_or_add(shape.width, dw, set);
                    shape.height = set_or_add(shape.height, dh, set);
                });
            }
            ComponentAction::Rotate { id, dr, set } => {
                self.modify(id, |shape| {
                    shape.rotation_degrees = set_or_add(shape.rotation_degrees, dr, set);
                });
            }
        }
    }

    /// Find a shape by id and change it in place, keeping order.
    fn modify(&mut self, id: ShapeId, change: impl FnOnce(&mut Shape)) {
        if let Some(shape) = self.get_mut(id) {
            change(shape);
            shape.clamp_size();
        }
    }

    /// Get a shape by id.
    pub fn get(&self, id: ShapeId) -> Option<&Shape> {
        self.shapes.iter().find(|shape| shape.id == id)
    }

    fn get_mut(&mut self, id: ShapeId) -> Option<&mut Shape> {
        self.shapes.iter_mut().find(|shape| shape.id == id)
    }

    /// Check if a shape with this id exists.
    pub fn contains(&self, id: ShapeId) -> bool {
        self.get(id).is_some()
    }

    /// Shapes in z-order (back to front).
    pub fn iter(&self) -> impl Iterator<Item = &Shape> {
        self.shapes.iter()
    }

    /// Shape ids in z-order.
    pub fn ids(&self) -> impl Iterator<Item = ShapeId> + '_ {
        self.shapes.iter().map(|shape| shape.id)
    }

    /// Consecutive pairs in z-order.
    pub fn adjacent_pairs(&self) -> impl Iterator<Item = (&Shape, &Shape)> {
        self.shapes.windows(2).map(|pair| (&pair[0], &pair[1]))
    }

    pub fn as_slice(&self) -> &[Shape] {
        &self.shapes
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }
}

impl<'a> IntoIterator for &'a ShapeCollection {
    type Item = &'a Shape;
    type IntoIter = std::slice::Iter<'a, Shape>;

    fn into_iter(self) -> Self::IntoIter {
        self.shapes.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashSet;

    fn sample() -> (ShapeCollection, ShapeId, ShapeId) {
        let a = Shape::rectangle(Point::new(10.0, 10.0), 50.0, 30.0);
        let b = Shape::circle(Point::new(100.0, 40.0), 20.0, 20.0);
        let (a_id, b_id) = (a.id(), b.id());
        (ShapeCollection::from_shapes([a, b]), a_id, b_id)
    }

    #[test]
    fn test_shape_creation() {
        let shape = Shape::circle(Point::new(1.0, 2.0), 30.0, 40.0);
        assert_eq!(shape.kind(), ShapeKind::Circle);
        assert_eq!(shape.bounds(), Rect::new(1.0, 2.0, 31.0, 42.0));
        assert!(shape.connections.is_empty());
        assert!((shape.rotation_degrees).abs() < f64::EPSILON);
    }

    #[test]
    fn test_default_shape() {
        let shape = Shape::default();
        assert_eq!(shape.kind(), ShapeKind::Rectangle);
        assert_eq!(shape.size(), Size::new(10.0, 10.0));
    }

    #[test]
    fn test_factory_ids_are_unique() {
        let ids: HashSet<_> = (0..100).map(|_| Shape::default().id()).collect();
        assert_eq!(ids.len(), 100);
    }

    #[test]
    fn test_add_appends() {
        let (collection, a, b) = sample();
        let c = Shape::default();
        let c_id = c.id();
        let collection = collection.apply(ComponentAction::Add(c));
        assert_eq!(collection.ids().collect::<Vec<_>>(), vec![a, b, c_id]);
    }

    #[test]
    fn test_add_duplicate_is_ignored() {
        let (collection, a, _) = sample();
        let duplicate = collection.get(a).unwrap().clone();
        let after = collection.clone().apply(ComponentAction::Add(duplicate));
        assert_eq!(after, collection);
    }

    #[test]
    fn test_remove() {
        let (collection, a, b) = sample();
        let collection = collection.apply(ComponentAction::Remove(a));
        assert_eq!(collection.ids().collect::<Vec<_>>(), vec![b]);
    }

    #[test]
    fn test_remove_absent_is_noop() {
        let (collection, _, _) = sample();
        let after = collection.clone().apply(ComponentAction::Remove(Uuid::new_v4()));
        assert_eq!(after, collection);
    }

    #[test]
    fn test_ids_stay_unique() {
        let shapes: Vec<Shape> = (0..5).map(|_| Shape::default()).collect();
        let mut collection = ShapeCollection::new();
        for shape in &shapes {
            collection.dispatch(ComponentAction::Add(shape.clone()));
        }
        collection.dispatch(ComponentAction::Remove(shapes[1].id()));
        collection.dispatch(ComponentAction::Add(shapes[3].clone()));
        collection.dispatch(ComponentAction::Add(shapes[1].clone()));
        collection.dispatch(ComponentAction::Add(shapes[1].clone()));

        let ids: Vec<_> = collection.ids().collect();
        let unique: HashSet<_> = ids.iter().copied().collect();
        assert_eq!(ids.len(), unique.len());
        assert_eq!(ids.len(), 5);
    }

    #[test]
    fn test_modify_merges_fields() {
        let (collection, a, b) = sample();
        let collection = collection.apply(ComponentAction::Modify {
            id: a,
            patch: ShapePatch::new().with_width(80.0).with_x(-4.0).with_connections(vec![b]),
        });
        let shape = collection.get(a).unwrap();
        assert!((shape.width - 80.0).abs() < f64::EPSILON);
        assert!((shape.height - 30.0).abs() < f64::EPSILON);
        assert_eq!(shape.position, Point::new(-4.0, 10.0));
        assert_eq!(shape.connections, vec![b]);
        assert_eq!(shape.id(), a);
        assert_eq!(shape.kind(), ShapeKind::Rectangle);
    }

    #[test]
    fn test_modify_preserves_order() {
        let (collection, a, b) = sample();
        let collection = collection.apply(ComponentAction::Modify {
            id: a,
            patch: ShapePatch::new().with_position(Point::new(500.0, 500.0)),
        });
        assert_eq!(collection.ids().collect::<Vec<_>>(), vec![a, b]);
    }

    #[test]
    fn test_move_set_is_idempotent() {
        let (collection, a, _) = sample();
        let action = ComponentAction::move_to(a, Point::new(7.0, 9.0));
        let once = collection.apply(action.clone());
        let twice = once.clone().apply(action);
        assert_eq!(once, twice);
        assert_eq!(once.get(a).unwrap().position, Point::new(7.0, 9.0));
    }

    #[test]
    fn test_move_delta_is_additive() {
        let (collection, a, _) = sample();
        let stepped = collection
            .clone()
            .apply(ComponentAction::move_by(a, 3.0, -2.0))
            .apply(ComponentAction::move_by(a, 4.0, 6.0));
        let combined = collection.apply(ComponentAction::move_by(a, 7.0, 4.0));
        assert_eq!(stepped, combined);
        assert_eq!(combined.get(a).unwrap().position, Point::new(17.0, 14.0));
    }

    #[test]
    fn test_resize_set_and_delta() {
        let (collection, a, _) = sample();
        let collection = collection
            .apply(ComponentAction::resize_to(a, Size::new(40.0, 20.0)))
            .apply(ComponentAction::resize_by(a, 5.0, -5.0));
        assert_eq!(collection.get(a).unwrap().size(), Size::new(45.0, 15.0));
    }

    #[test]
    fn test_resize_clamps_at_zero() {
        let (collection, a, _) = sample();
        let collection = collection.apply(ComponentAction::resize_by(a, -500.0, -500.0));
        assert_eq!(collection.get(a).unwrap().size(), Size::ZERO);
    }

    #[test]
    fn test_rotate_set_and_delta() {
        let (collection, _, b) = sample();
        let collection = collection
            .apply(ComponentAction::rotate_to(b, 45.0))
            .apply(ComponentAction::rotate_by(b, -15.0));
        assert!((collection.get(b).unwrap().rotation_degrees - 30.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_unknown_id_is_noop() {
        let (collection, _, _) = sample();
        let ghost = Uuid::new_v4();
        for action in [
            ComponentAction::move_by(ghost, 1.0, 1.0),
            ComponentAction::resize_to(ghost, Size::new(1.0, 1.0)),
            ComponentAction::rotate_by(ghost, 90.0),
            ComponentAction::Modify { id: ghost, patch: ShapePatch::new().with_width(1.0) },
        ] {
            assert_eq!(collection.clone().apply(action), collection);
        }
    }

    #[test]
    fn test_replay_is_deterministic() {
        let (collection, a, b) = sample();
        let actions = vec![
            ComponentAction::move_by(a, 1.0, 2.0),
            ComponentAction::rotate_to(b, 90.0),
            ComponentAction::Remove(a),
            ComponentAction::resize_by(b, 2.0, 2.0),
        ];
        let run = |start: ShapeCollection| {
            actions.iter().cloned().fold(start, ShapeCollection::apply)
        };
        assert_eq!(run(collection.clone()), run(collection));
    }

    #[test]
    fn test_adjacent_pairs() {
        let (collection, a, b) = sample();
        let pairs: Vec<_> = collection.adjacent_pairs().map(|(x, y)| (x.id(), y.id())).collect();
        assert_eq!(pairs, vec![(a, b)]);
        assert_eq!(ShapeCollection::new().adjacent_pairs().count(), 0);
    }
}
