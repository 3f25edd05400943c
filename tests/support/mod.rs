// Copyright 2025 Cowboy AI, LLC.

//! Shapes shared by the integration tests

#![allow(dead_code)]

use std::any::Any;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use cim_shapes::{Constructor, ExpectedType, RawField, RawShape, Typed, Value};

#[derive(Debug, Clone, PartialEq)]
pub struct Date {
    pub millis: f64,
}

impl Typed for Date {
    fn as_any(&self) -> &dyn Any {
        self
    }
    fn type_name(&self) -> &'static str {
        "Date"
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Typed for Point {
    fn as_any(&self) -> &dyn Any {
        self
    }
    fn type_name(&self) -> &'static str {
        "Point"
    }
}

#[derive(Debug)]
pub struct Circle {
    pub center: Value,
    pub radius: f64,
}

impl Typed for Circle {
    fn as_any(&self) -> &dyn Any {
        self
    }
    fn type_name(&self) -> &'static str {
        "Circle"
    }
}

#[derive(Debug)]
pub struct Segment {
    pub from: Value,
    pub to: Value,
}

impl Typed for Segment {
    fn as_any(&self) -> &dyn Any {
        self
    }
    fn type_name(&self) -> &'static str {
        "Segment"
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Email {
    pub subject: String,
    pub body: String,
}

impl Typed for Email {
    fn as_any(&self) -> &dyn Any {
        self
    }
    fn type_name(&self) -> &'static str {
        "Email"
    }
}

/// A value with no fields of interest, tagged by name
#[derive(Debug, Clone, PartialEq)]
pub struct Tagged(pub &'static str);

impl Typed for Tagged {
    fn as_any(&self) -> &dyn Any {
        self
    }
    fn type_name(&self) -> &'static str {
        self.0
    }
}

fn number(args: &[Value], index: usize) -> f64 {
    args.get(index).and_then(Value::as_f64).unwrap_or_default()
}

pub fn date_constructor() -> Constructor {
    Constructor::new("Date", |args: Vec<Value>| Ok(Date { millis: number(&args, 0) }))
}

pub fn point_constructor() -> Constructor {
    Constructor::new("Point", |args: Vec<Value>| {
        Ok(Point {
            x: number(&args, 0),
            y: number(&args, 1),
        })
    })
}

/// `{type: "Date", millis: number}`
pub fn date_shape() -> RawShape {
    RawShape::of(date_constructor())
        .field("type", RawField::literal("Date"))
        .field("millis", RawField::typed(ExpectedType::Number))
        .build_arguments(|fields, _, _| Ok(fields.get("millis").cloned().map(|m| vec![m])))
}

/// `{x: number, y: number}`, counting argument-builder calls
pub fn point_shape(calls: Arc<AtomicUsize>) -> RawShape {
    RawShape::of(point_constructor())
        .field("x", RawField::typed(ExpectedType::Number))
        .field("y", RawField::typed(ExpectedType::Number))
        .build_arguments(move |fields, _, _| {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(Some(vec![
                fields.get("x").cloned().unwrap_or_default(),
                fields.get("y").cloned().unwrap_or_default(),
            ]))
        })
}

/// `{center: Point, radius: number}`
pub fn circle_shape() -> RawShape {
    RawShape::of(Constructor::new("Circle", |mut args: Vec<Value>| {
        let radius = number(&args, 1);
        let center = args.swap_remove(0);
        Ok(Circle { center, radius })
    }))
    .field("center", RawField::typed(ExpectedType::Instance(point_constructor())))
    .field("radius", RawField::typed(ExpectedType::Number))
    .build_arguments(|fields, _, _| {
        Ok(Some(vec![
            fields.get("center").cloned().unwrap_or_default(),
            fields.get("radius").cloned().unwrap_or_default(),
        ]))
    })
}

/// `{from: Point, to: Point}`
pub fn segment_shape() -> RawShape {
    RawShape::of(Constructor::new("Segment", |mut args: Vec<Value>| {
        let to = args.pop().unwrap_or_default();
        let from = args.pop().unwrap_or_default();
        Ok(Segment { from, to })
    }))
    .field("from", RawField::new())
    .field("to", RawField::new())
    .build_arguments(|fields, _, _| {
        Ok(Some(vec![
            fields.get("from").cloned().unwrap_or_default(),
            fields.get("to").cloned().unwrap_or_default(),
        ]))
    })
}

/// `{subject: string, body: string}` where `body` requires trust
pub fn email_shape() -> RawShape {
    RawShape::of(Constructor::new("Email", |args: Vec<Value>| {
        let text = |i: usize| args.get(i).and_then(Value::as_str).unwrap_or_default().to_string();
        Ok(Email {
            subject: text(0),
            body: text(1),
        })
    }))
    .field("subject", RawField::typed(ExpectedType::String))
    .field(
        "body",
        RawField::typed(ExpectedType::String).requires_trust("[redacted]"),
    )
    .build_arguments(|fields, _, _| {
        Ok(Some(vec![
            fields.get("subject").cloned().unwrap_or_default(),
            fields.get("body").cloned().unwrap_or_default(),
        ]))
    })
}

/// A shape named `name` that accepts bags with exactly `keys`, all required
pub fn keyed_shape(name: &'static str, keys: &[&str]) -> RawShape {
    let mut raw = RawShape::of(Constructor::new(name, move |_args: Vec<Value>| Ok(Tagged(name))));
    for key in keys {
        raw = raw.field(*key, RawField::new());
    }
    raw.without_fields()
        .build_arguments(|_, _, _| Ok(Some(Vec::new())))
}

/// Name of the `Tagged` value produced by a `keyed_shape`
pub fn tag_of(value: &Value) -> Option<&'static str> {
    value
        .as_instance()
        .and_then(|i| i.downcast_ref::<Tagged>())
        .map(|t| t.0)
}

pub fn counter() -> Arc<AtomicUsize> {
    Arc::new(AtomicUsize::new(0))
}

pub fn count(counter: &AtomicUsize) -> usize {
    counter.load(Ordering::SeqCst)
}
