//! Plugin registry: element factories looked up by type name.
//!
//! Every element in a behavior file is a TOML table with a `type` key.  The
//! registry maps that name to a factory for the element's category; the
//! factory reads its parameters from an [`ElementSpec`] and returns the
//! constructed element.  After construction the FSM only sees the element's
//! trait object.
//!
//! ```ignore
//! let mut registry = Registry::with_builtins();
//! registry.conditions.register("always_false", |_, _| Ok(Box::new(NotCondition {
//!     inner: Box::new(AutoCondition),
//! })));
//! ```

use std::path::Path;
use std::sync::Arc;

use bfsm_core::{FloatGenerator, Shape, Vec2, Vec2Generator};
use bfsm_goals::{GoalSelector, NavMesh, NavMeshLocalizer};
use rustc_hash::FxHashMap;
use toml::{Table, Value};

use crate::{
    Action, BuildError, BuildResult, Condition, EventEffect, EventTarget, EventTrigger, Task,
    TransitionTarget, VelComponent, VelModifier,
};

// ── Resources ─────────────────────────────────────────────────────────────────

/// Named shared objects elements may refer to, such as navigation meshes.
#[derive(Debug, Default)]
pub struct Resources {
    nav_meshes: FxHashMap<String, Arc<NavMeshLocalizer>>,
}

impl Resources {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a mesh under `name`.  Every element naming it shares one
    /// localizer.
    pub fn add_nav_mesh(&mut self, name: impl Into<String>, mesh: Arc<dyn NavMesh>) -> Arc<NavMeshLocalizer> {
        let localizer = Arc::new(NavMeshLocalizer::new(mesh));
        self.nav_meshes.insert(name.into(), Arc::clone(&localizer));
        localizer
    }

    pub fn nav_mesh(&self, name: &str) -> Option<&Arc<NavMeshLocalizer>> {
        self.nav_meshes.get(name)
    }
}

// ── FactoryContext ────────────────────────────────────────────────────────────

pub struct FactoryContext<'a> {
    /// Folder of the description file; relative paths resolve against it.
    pub base_folder: &'a Path,
    pub resources:   &'a Resources,
    /// For elements that nest other elements (`and`, `or`, `not`).
    pub registry:    &'a Registry,
}

// ── ElementSpec ───────────────────────────────────────────────────────────────

/// One element node: its type name and the rest of its table.
#[derive(Clone, Debug, PartialEq)]
pub struct ElementSpec {
    pub kind:   String,
    pub params: Table,
}

fn as_f32(v: &Value) -> Option<f32> {
    match v {
        Value::Float(f) => Some(*f as f32),
        Value::Integer(i) => Some(*i as f32),
        _ => None,
    }
}

fn as_vec2(v: &Value) -> Option<Vec2> {
    match v.as_array()?.as_slice() {
        [x, y] => Some(Vec2::new(as_f32(x)?, as_f32(y)?)),
        _ => None,
    }
}

impl ElementSpec {
    pub fn new(kind: impl Into<String>, params: Table) -> Self {
        Self { kind: kind.into(), params }
    }

    /// Split the `type` key off a table.
    pub fn from_table(mut table: Table, category: &str) -> BuildResult<Self> {
        match table.remove("type") {
            Some(Value::String(kind)) => Ok(Self { kind, params: table }),
            Some(_) => Err(BuildError::Param {
                kind:   category.to_owned(),
                key:    "type".to_owned(),
                reason: "must be a string".to_owned(),
            }),
            None => Err(BuildError::Param {
                kind:   category.to_owned(),
                key:    "type".to_owned(),
                reason: "is missing".to_owned(),
            }),
        }
    }

    pub fn param_error(&self, key: &str, reason: impl Into<String>) -> BuildError {
        BuildError::Param { kind: self.kind.clone(), key: key.to_owned(), reason: reason.into() }
    }

    fn required(&self, key: &str) -> BuildResult<&Value> {
        self.params.get(key).ok_or_else(|| self.param_error(key, "is missing"))
    }

    pub fn has(&self, key: &str) -> bool {
        self.params.contains_key(key)
    }

    pub fn f32(&self, key: &str) -> BuildResult<f32> {
        as_f32(self.required(key)?).ok_or_else(|| self.param_error(key, "must be a number"))
    }

    pub fn f32_or(&self, key: &str, default: f32) -> BuildResult<f32> {
        if self.has(key) { self.f32(key) } else { Ok(default) }
    }

    pub fn bool_or(&self, key: &str, default: bool) -> BuildResult<bool> {
        match self.params.get(key) {
            None => Ok(default),
            Some(v) => v.as_bool().ok_or_else(|| self.param_error(key, "must be a boolean")),
        }
    }

    pub fn str(&self, key: &str) -> BuildResult<&str> {
        self.required(key)?
            .as_str()
            .ok_or_else(|| self.param_error(key, "must be a string"))
    }

    pub fn u32(&self, key: &str) -> BuildResult<u32> {
        let v = self
            .required(key)?
            .as_integer()
            .ok_or_else(|| self.param_error(key, "must be an integer"))?;
        u32::try_from(v).map_err(|_| self.param_error(key, format!("{v} is out of range")))
    }

    pub fn vec2(&self, key: &str) -> BuildResult<Vec2> {
        as_vec2(self.required(key)?).ok_or_else(|| self.param_error(key, "must be an [x, y] pair"))
    }

    /// A number, or a table `{ dist = "c" | "u" | "n", ... }`.
    pub fn float_gen(&self, key: &str) -> BuildResult<FloatGenerator> {
        let value = self.required(key)?;
        if let Some(v) = as_f32(value) {
            return Ok(FloatGenerator::constant(v));
        }
        let Some(table) = value.as_table() else {
            return Err(self.param_error(key, "must be a number or a distribution table"));
        };
        let field = |name: &str| -> BuildResult<f32> {
            table
                .get(name)
                .and_then(as_f32)
                .ok_or_else(|| self.param_error(key, format!("distribution needs a numeric {name:?}")))
        };
        let optional = |name: &str, default: f32| -> BuildResult<f32> {
            if table.contains_key(name) { field(name) } else { Ok(default) }
        };
        let dist = table.get("dist").and_then(Value::as_str).unwrap_or("c");
        let generator = match dist {
            "c" | "const" => FloatGenerator::constant(field("value")?),
            "u" | "uniform" => FloatGenerator::uniform(field("min")?, field("max")?)?,
            "n" | "normal" => FloatGenerator::normal(
                field("mean")?,
                field("std")?,
                optional("min", f32::NEG_INFINITY)?,
                optional("max", f32::INFINITY)?,
            )?,
            other => return Err(self.param_error(key, format!("unknown distribution {other:?}"))),
        };
        Ok(generator)
    }

    /// An `[x, y]` pair, or a table `{ dist = "c" | "aabb" | "disk", ... }`.
    pub fn vec2_gen(&self, key: &str) -> BuildResult<Vec2Generator> {
        let value = self.required(key)?;
        if let Some(v) = as_vec2(value) {
            return Ok(Vec2Generator::constant(v));
        }
        let Some(table) = value.as_table() else {
            return Err(self.param_error(key, "must be an [x, y] pair or a distribution table"));
        };
        let point = |name: &str| -> BuildResult<Vec2> {
            table
                .get(name)
                .and_then(as_vec2)
                .ok_or_else(|| self.param_error(key, format!("distribution needs an [x, y] {name:?}")))
        };
        let dist = table.get("dist").and_then(Value::as_str).unwrap_or("c");
        let generator = match dist {
            "c" | "const" => Vec2Generator::constant(point("value")?),
            "u" | "aabb" => Vec2Generator::aabb(point("min")?, point("max")?),
            "disk" => {
                let radius = table
                    .get("radius")
                    .and_then(as_f32)
                    .ok_or_else(|| self.param_error(key, "disk distribution needs a numeric \"radius\""))?;
                Vec2Generator::disk(point("center")?, radius)?
            }
            other => return Err(self.param_error(key, format!("unknown distribution {other:?}"))),
        };
        Ok(generator)
    }

    /// An array of tables under `key`.
    pub fn tables(&self, key: &str) -> BuildResult<Vec<&Table>> {
        let array = self
            .required(key)?
            .as_array()
            .ok_or_else(|| self.param_error(key, "must be an array of tables"))?;
        array
            .iter()
            .map(|v| v.as_table().ok_or_else(|| self.param_error(key, "must be an array of tables")))
            .collect()
    }

    /// A nested element table under `key`.
    pub fn nested(&self, key: &str) -> BuildResult<ElementSpec> {
        let table = self
            .required(key)?
            .as_table()
            .ok_or_else(|| self.param_error(key, "must be a table with a \"type\" key"))?;
        ElementSpec::from_table(table.clone(), &self.kind)
    }

    /// The shape this element describes, reading its own `type`
    /// (`point`, `circle`, `aabb`, `obb`).
    pub fn shape(&self) -> BuildResult<Shape> {
        match self.kind.as_str() {
            "point" => Ok(Shape::point(self.vec2("pos")?)),
            "circle" => Ok(Shape::circle(self.vec2("center")?, self.f32("radius")?)),
            "aabb" => Ok(Shape::aabb(self.vec2("min")?, self.vec2("max")?)),
            "obb" => Ok(Shape::obb_degrees(self.vec2("pivot")?, self.vec2("size")?, self.f32_or("angle", 0.0)?)),
            other => Err(BuildError::UnknownElement { category: "shape", kind: other.to_owned() }),
        }
    }
}

// ── Factories ─────────────────────────────────────────────────────────────────

type Factory<T> =
    Box<dyn Fn(&ElementSpec, &FactoryContext<'_>) -> BuildResult<Box<T>> + Send + Sync>;

/// Factories for one element category.
pub struct FactoryMap<T: ?Sized> {
    category:  &'static str,
    factories: FxHashMap<String, Factory<T>>,
}

impl<T: ?Sized> FactoryMap<T> {
    fn new(category: &'static str) -> Self {
        Self { category, factories: FxHashMap::default() }
    }

    /// Register (or replace) the factory for `kind`.
    pub fn register<F>(&mut self, kind: impl Into<String>, factory: F)
    where
        F: Fn(&ElementSpec, &FactoryContext<'_>) -> BuildResult<Box<T>> + Send + Sync + 'static,
    {
        self.factories.insert(kind.into(), Box::new(factory));
    }

    pub fn contains(&self, kind: &str) -> bool {
        self.factories.contains_key(kind)
    }

    pub fn create(&self, spec: &ElementSpec, ctx: &FactoryContext<'_>) -> BuildResult<Box<T>> {
        let factory = self.factories.get(&spec.kind).ok_or_else(|| BuildError::UnknownElement {
            category: self.category,
            kind:     spec.kind.clone(),
        })?;
        factory(spec, ctx)
    }

    /// Registered type names, sorted.
    pub fn kinds(&self) -> Vec<&str> {
        let mut kinds: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        kinds.sort_unstable();
        kinds
    }
}

pub struct Registry {
    pub conditions:     FactoryMap<dyn Condition>,
    pub targets:        FactoryMap<dyn TransitionTarget>,
    pub actions:        FactoryMap<dyn Action>,
    pub selectors:      FactoryMap<dyn GoalSelector>,
    pub vel_components: FactoryMap<dyn VelComponent>,
    pub vel_modifiers:  FactoryMap<dyn VelModifier>,
    pub triggers:       FactoryMap<dyn EventTrigger>,
    pub event_targets:  FactoryMap<dyn EventTarget>,
    pub event_effects:  FactoryMap<dyn EventEffect>,
    pub tasks:          FactoryMap<dyn Task>,
}

impl Registry {
    /// A registry with no factories.
    pub fn new() -> Self {
        Self {
            conditions:     FactoryMap::new("condition"),
            targets:        FactoryMap::new("transition target"),
            actions:        FactoryMap::new("action"),
            selectors:      FactoryMap::new("goal selector"),
            vel_components: FactoryMap::new("velocity component"),
            vel_modifiers:  FactoryMap::new("velocity modifier"),
            triggers:       FactoryMap::new("event trigger"),
            event_targets:  FactoryMap::new("event target"),
            event_effects:  FactoryMap::new("event effect"),
            tasks:          FactoryMap::new("task"),
        }
    }

    /// A registry with every built-in element registered.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        crate::builtins::register_all(&mut registry);
        registry
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::with_builtins()
    }
}
