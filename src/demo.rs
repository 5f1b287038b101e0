use std::any::Any;
use std::sync::Arc;

use anyhow::{anyhow, Context};
use parking_lot::Mutex;

use crate::error::RegistryError;
use crate::loader::RegistryLoader;
use crate::registry::command::CommandBuilder;
use crate::registry::converter::ConverterDescriptor;
use crate::registry::presenter::PresenterDescriptor;
use crate::registry::types::{fuzzy_contains, TypeTable, TypeTag};
use crate::registry::Registry;
use crate::value::{ConsoleObject, ObjectRef, Value};

// ── Scene objects ───────────────────────────────────────────────

#[derive(Debug)]
pub struct GameObject {
    name: Mutex<String>,
    components: Mutex<Vec<ObjectRef>>,
}

impl GameObject {
    pub fn new(name: &str) -> Arc<Self> {
        let object = Arc::new(Self {
            name: Mutex::new(name.to_string()),
            components: Mutex::new(Vec::new()),
        });
        object.add(Transform::new(name));
        object
    }

    pub fn name(&self) -> String {
        self.name.lock().clone()
    }

    pub fn add(&self, component: impl ConsoleObject + 'static) {
        self.components.lock().push(Arc::new(component));
    }

    pub fn components(&self) -> Vec<ObjectRef> {
        self.components.lock().clone()
    }
}

impl ConsoleObject for GameObject {
    fn type_name(&self) -> &str {
        "GameObject"
    }

    fn display_name(&self) -> String {
        self.name()
    }

    fn property(&self, name: &str) -> Option<Value> {
        match name {
            "name" => Some(Value::String(self.name())),
            "components" => Some(Value::List(self.components().into_iter().map(Value::Object).collect())),
            _ => None,
        }
    }

    fn property_names(&self) -> Vec<String> {
        vec!["name".into(), "components".into()]
    }

    fn element(&self, index: i64) -> Option<Value> {
        let i = usize::try_from(index).ok()?;
        self.components.lock().get(i).cloned().map(Value::Object)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[derive(Debug)]
pub struct Transform {
    owner: String,
    position: Mutex<[f64; 3]>,
}

impl Transform {
    fn new(owner: &str) -> Self {
        Self {
            owner: owner.to_string(),
            position: Mutex::new([0.0; 3]),
        }
    }

    fn position(&self) -> Value {
        Value::List(self.position.lock().iter().copied().map(Value::Float).collect())
    }
}

impl ConsoleObject for Transform {
    fn type_name(&self) -> &str {
        "Transform"
    }

    fn display_name(&self) -> String {
        format!("{} (Transform)", self.owner)
    }

    fn property(&self, name: &str) -> Option<Value> {
        let [x, y, z] = *self.position.lock();
        match name {
            "owner" => Some(Value::String(self.owner.clone())),
            "position" => Some(self.position()),
            "x" => Some(Value::Float(x)),
            "y" => Some(Value::Float(y)),
            "z" => Some(Value::Float(z)),
            _ => None,
        }
    }

    fn property_names(&self) -> Vec<String> {
        vec!["owner".into(), "position".into()]
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[derive(Debug)]
pub struct Camera {
    owner: String,
    fov: Mutex<f64>,
}

impl ConsoleObject for Camera {
    fn type_name(&self) -> &str {
        "Camera"
    }

    fn display_name(&self) -> String {
        format!("{} (Camera)", self.owner)
    }

    fn property(&self, name: &str) -> Option<Value> {
        match name {
            "owner" => Some(Value::String(self.owner.clone())),
            "fov" => Some(Value::Float(*self.fov.lock())),
            _ => None,
        }
    }

    fn property_names(&self) -> Vec<String> {
        vec!["owner".into(), "fov".into()]
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[derive(Debug)]
pub struct Light {
    owner: String,
    intensity: Mutex<f64>,
}

impl ConsoleObject for Light {
    fn type_name(&self) -> &str {
        "Light"
    }

    fn display_name(&self) -> String {
        format!("{} (Light)", self.owner)
    }

    fn property(&self, name: &str) -> Option<Value> {
        match name {
            "owner" => Some(Value::String(self.owner.clone())),
            "intensity" => Some(Value::Float(*self.intensity.lock())),
            _ => None,
        }
    }

    fn property_names(&self) -> Vec<String> {
        vec!["owner".into(), "intensity".into()]
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

// ── Scene ───────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct Scene {
    objects: Mutex<Vec<Arc<GameObject>>>,
}

impl Scene {
    pub fn objects(&self) -> Vec<Arc<GameObject>> {
        self.objects.lock().clone()
    }

    pub fn spawn(&self, name: &str) -> Arc<GameObject> {
        let object = GameObject::new(name);
        self.objects.lock().push(Arc::clone(&object));
        object
    }

    pub fn by_name(&self, name: &str) -> Option<Arc<GameObject>> {
        self.objects.lock().iter().find(|o| o.name() == name).cloned()
    }

    /// Every object and component, as console values.
    fn everything(&self) -> Vec<(String, Value)> {
        let mut out = Vec::new();
        for object in self.objects() {
            let name = object.name();
            for component in object.components() {
                out.push((name.clone(), Value::Object(component)));
            }
            out.push((name, Value::Object(object)));
        }
        out
    }
}

/// Three objects: a camera, a light, and a bare player.
pub fn create_demo_scene() -> Arc<Scene> {
    let scene = Arc::new(Scene::default());

    let camera = scene.spawn("Main Camera");
    camera.add(Camera {
        owner: camera.name(),
        fov: Mutex::new(60.0),
    });

    let sun = scene.spawn("Sun");
    sun.add(Light {
        owner: sun.name(),
        intensity: Mutex::new(1.0),
    });

    scene.spawn("Player");
    scene
}

// ── Registration ────────────────────────────────────────────────

/// Registers the demo scene's types, commands, converter, presenter and
/// the `@main` global.
pub struct DemoHost {
    scene: Arc<Scene>,
}

impl Default for DemoHost {
    fn default() -> Self {
        Self::new(create_demo_scene())
    }
}

impl DemoHost {
    pub fn new(scene: Arc<Scene>) -> Self {
        Self { scene }
    }

    pub fn scene(&self) -> Arc<Scene> {
        Arc::clone(&self.scene)
    }
}

fn arg(args: &[Value], i: usize) -> anyhow::Result<&Value> {
    args.get(i).with_context(|| format!("missing argument {i}"))
}

fn float_arg(args: &[Value], i: usize) -> anyhow::Result<f64> {
    arg(args, i)?
        .as_float()
        .with_context(|| format!("argument {i} must be a number"))
}

fn target_as<'a, T: 'static>(target: Option<&'a Value>, what: &str) -> anyhow::Result<&'a T> {
    target
        .and_then(Value::downcast::<T>)
        .ok_or_else(|| anyhow!("target is not a {what}"))
}

impl RegistryLoader for DemoHost {
    fn load(&self, registry: &mut Registry) -> Result<(), RegistryError> {
        let game_object = registry.register_type("GameObject", None)?;
        registry.register_type("Component", None)?;
        let transform = registry.register_type("Transform", Some("Component"))?;
        let camera = registry.register_type("Camera", Some("Component"))?;
        let light = registry.register_type("Light", Some("Component"))?;
        let types = Arc::new(registry.types().clone());

        // ── Static commands ──

        let scene = self.scene();
        let lookup = Arc::clone(&types);
        registry.register_command(
            CommandBuilder::new("find")
                .description("Find an object or component by type and name")
                .param("type", TypeTag::TYPE)
                .param("name", TypeTag::STRING)
                .host(move |_, args| {
                    let wanted = arg(args, 0)?.as_type().context("expected a type")?.tag;
                    let pattern = arg(args, 1)?.to_string();
                    Ok(scene
                        .everything()
                        .into_iter()
                        .find(|(name, value)| {
                            lookup
                                .tag_of(value)
                                .is_some_and(|t| lookup.is_assignable(wanted, t))
                                && fuzzy_contains(name, &pattern)
                        })
                        .map(|(_, value)| value)
                        .unwrap_or_default())
                }),
        )?;

        let scene = self.scene();
        registry.register_command(
            CommandBuilder::new("objects")
                .description("List every object in the scene")
                .host(move |_, _| {
                    Ok(Value::List(
                        scene
                            .objects()
                            .into_iter()
                            .map(|o| Value::Object(o as ObjectRef))
                            .collect(),
                    ))
                }),
        )?;

        let scene = self.scene();
        registry.register_command(
            CommandBuilder::new("spawn")
                .description("Create an empty object")
                .param("name", TypeTag::STRING)
                .host(move |_, args| {
                    let name = arg(args, 0)?.to_string();
                    if scene.by_name(&name).is_some() {
                        return Err(anyhow!("an object named '{name}' already exists"));
                    }
                    Ok(Value::Object(scene.spawn(&name)))
                }),
        )?;

        let lookup = Arc::clone(&types);
        registry.register_command(
            CommandBuilder::new("getcomponent")
                .description("Get an object's first component of a type")
                .param("object", game_object)
                .param("type", TypeTag::TYPE)
                .host(move |_, args| {
                    let object = arg(args, 0)?.downcast::<GameObject>().context("expected an object")?;
                    let wanted = arg(args, 1)?.as_type().context("expected a type")?.tag;
                    Ok(object
                        .components()
                        .into_iter()
                        .map(Value::Object)
                        .find(|c| lookup.tag_of(c).is_some_and(|t| lookup.is_assignable(wanted, t)))
                        .unwrap_or_default())
                }),
        )?;

        registry.register_command(
            CommandBuilder::new("crash")
                .description("Always fails; the error is logged and the result is null")
                .hidden()
                .host(|_, _| Err(anyhow!("crash requested"))),
        )?;

        // ── Instance commands ──

        registry.register_command(
            CommandBuilder::new("rename")
                .description("Rename an object")
                .target(game_object)
                .param("name", TypeTag::STRING)
                .host(|target, args| {
                    let object = target_as::<GameObject>(target, "GameObject")?;
                    *object.name.lock() = arg(args, 0)?.to_string();
                    Ok(target.cloned().unwrap_or_default())
                }),
        )?;

        registry.register_command(
            CommandBuilder::new("zoom")
                .description("Divide the field of view by a factor")
                .target(camera)
                .param("factor", TypeTag::FLOAT)
                .host(|target, args| {
                    let cam = target_as::<Camera>(target, "Camera")?;
                    let factor = float_arg(args, 0)?;
                    if factor <= 0.0 {
                        return Err(anyhow!("zoom factor must be positive"));
                    }
                    let mut fov = cam.fov.lock();
                    *fov /= factor;
                    Ok(Value::Float(*fov))
                }),
        )?;

        registry.register_command(
            CommandBuilder::new("move")
                .description("Translate by an offset")
                .target(transform)
                .param("x", TypeTag::FLOAT)
                .param("y", TypeTag::FLOAT)
                .param("z", TypeTag::FLOAT)
                .host(|target, args| {
                    let t = target_as::<Transform>(target, "Transform")?;
                    {
                        let mut position = t.position.lock();
                        for (axis, i) in position.iter_mut().zip(0..) {
                            *axis += float_arg(args, i)?;
                        }
                    }
                    Ok(t.position())
                }),
        )?;

        registry.register_command(
            CommandBuilder::new("dim")
                .description("Scale a light's intensity")
                .target(light)
                .param("amount", TypeTag::FLOAT)
                .host(|target, args| {
                    let l = target_as::<Light>(target, "Light")?;
                    let mut intensity = l.intensity.lock();
                    *intensity = (*intensity * float_arg(args, 0)?).clamp(0.0, 10.0);
                    Ok(Value::Float(*intensity))
                }),
        )?;

        // ── Converter, presenter, globals ──

        let scene = self.scene();
        registry.register_converter(ConverterDescriptor::new(game_object, TypeTag::STRING, move |value, _, _| {
            scene
                .by_name(value.as_str()?)
                .map(|o| Value::Object(o as ObjectRef))
        }));

        registry.register_presenter(PresenterDescriptor::new(game_object, |value, types: &TypeTable| {
            let Some(object) = value.downcast::<GameObject>() else {
                return Vec::new();
            };
            let mut lines = vec![format!("{} (GameObject)", object.name())];
            for (i, component) in object.components().iter().enumerate() {
                let kind = types.lookup(component.type_name()).map_or("object", |t| types.name(t));
                lines.push(format!("  [{i}] {kind}"));
            }
            lines
        }));

        let main = self
            .scene
            .by_name("Main Camera")
            .and_then(|o| {
                o.components()
                    .into_iter()
                    .find(|c| c.type_name() == "Camera")
            })
            .map_or(Value::Null, Value::Object);
        registry.set_global("main", main);

        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::loader::discover_blocking;

    #[test]
    fn demo_registers_types_and_commands() {
        let registry = discover_blocking(&DemoHost::default()).unwrap();
        let types = registry.types();
        let camera = types.lookup("Camera").unwrap();
        let component = types.lookup("Component").unwrap();
        assert!(types.is_assignable(component, camera));
        for name in ["find", "objects", "spawn", "getcomponent", "rename", "zoom", "move", "dim"] {
            assert!(registry.command(name).is_some(), "missing {name}");
        }
        assert!(registry.command("zoom").unwrap().takes_target());
    }

    #[test]
    fn main_global_is_the_camera() {
        let registry = discover_blocking(&DemoHost::default()).unwrap();
        let main = registry.global("main").unwrap();
        assert_eq!(main.to_string(), "Main Camera (Camera)");
        assert_eq!(main.downcast::<Camera>().unwrap().owner, "Main Camera");
    }

    #[test]
    fn game_object_elements_are_components() {
        let scene = create_demo_scene();
        let camera = scene.by_name("Main Camera").unwrap();
        assert_eq!(camera.element(1).unwrap().to_string(), "Main Camera (Camera)");
        assert!(camera.element(5).is_none());
        assert!(camera.element(-1).is_none());
    }
}
