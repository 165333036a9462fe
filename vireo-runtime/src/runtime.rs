//! Component lifecycle: discovery, resolution and the render loop.

use std::cell::{Cell, Ref, RefCell, RefMut};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::rc::{Rc, Weak};

use tracing::{debug, error, instrument, warn};
use vireo_core::{Config, Hooks, Notifier, Object, Value, observe};
use vireo_dom::patch::patch_children;
use vireo_dom::serialize::{inner_html, outer_html};
use vireo_dom::{ComponentId, Document, NodeId, NodeKind, VNode, is_component_host};
use vireo_template::{CompiledTemplate, Scope, compile, evaluate, resolve};

use crate::capabilities::{
    Capabilities, ChangeDetector, ElementRef, EventEmitter, MapLoader, TemplateLoader,
};
use crate::error::RuntimeError;
use crate::registry::{Registry, controller_name};

/// One resolved host element: its controller, compiled template and the
/// generation it last committed.
pub struct Instance {
    id: ComponentId,
    host: NodeId,
    name: String,
    state: Object,
    hooks: Hooks,
    template: CompiledTemplate,
    generation: RefCell<Option<Vec<VNode>>>,
    resolved: Cell<bool>,
    rendering: Cell<bool>,
    dirty: Cell<bool>,
    mounted: Cell<bool>,
    renders: Cell<usize>,
}

impl Instance {
    pub fn id(&self) -> ComponentId {
        self.id
    }

    pub fn host(&self) -> NodeId {
        self.host
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> &Object {
        &self.state
    }

    pub fn is_resolved(&self) -> bool {
        self.resolved.get()
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted.get()
    }

    /// Completed render passes so far.
    pub fn render_count(&self) -> usize {
        self.renders.get()
    }

    /// The generation committed by the last pass.
    pub fn generation(&self) -> Option<Vec<VNode>> {
        self.generation.borrow().clone()
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instance")
            .field("id", &self.id)
            .field("host", &self.host)
            .field("name", &self.name)
            .field("renders", &self.renders.get())
            .finish()
    }
}

pub(crate) struct RuntimeInner {
    doc: Rc<RefCell<Document>>,
    registry: Registry,
    config: Config,
    loader: RefCell<Rc<dyn TemplateLoader>>,
    globals: RefCell<Object>,
    instances: RefCell<HashMap<NodeId, Rc<Instance>>>,
    failed: RefCell<HashSet<NodeId>>,
    errors: RefCell<Vec<RuntimeError>>,
    next_id: Cell<u64>,
}

/// Shared handle to the component runtime. Cloning is cheap.
#[derive(Clone)]
pub struct Runtime(Rc<RuntimeInner>);

impl Runtime {
    pub fn new(registry: Registry, document: Document) -> Self {
        Self::with_config(registry, document, Config::default())
    }

    pub fn with_config(registry: Registry, document: Document, config: Config) -> Self {
        Runtime(Rc::new(RuntimeInner {
            doc: Rc::new(RefCell::new(document)),
            registry,
            config,
            loader: RefCell::new(Rc::new(MapLoader::new())),
            globals: RefCell::new(Object::new()),
            instances: RefCell::new(HashMap::new()),
            failed: RefCell::new(HashSet::new()),
            errors: RefCell::new(Vec::new()),
            next_id: Cell::new(1),
        }))
    }

    pub(crate) fn from_inner(inner: Rc<RuntimeInner>) -> Self {
        Runtime(inner)
    }

    pub fn set_loader(&self, loader: impl TemplateLoader + 'static) {
        *self.0.loader.borrow_mut() = Rc::new(loader);
    }

    /// Values expressions may read when their names are allow-listed.
    pub fn set_globals(&self, globals: Object) {
        *self.0.globals.borrow_mut() = globals;
    }

    pub fn config(&self) -> &Config {
        &self.0.config
    }

    pub fn document(&self) -> Ref<'_, Document> {
        self.0.doc.borrow()
    }

    /// Direct document access. Do not hold the guard across state writes.
    pub fn document_mut(&self) -> RefMut<'_, Document> {
        self.0.doc.borrow_mut()
    }

    pub fn inner_html(&self, node: NodeId) -> String {
        inner_html(&self.0.doc.borrow(), node)
    }

    pub fn outer_html(&self, node: NodeId) -> String {
        outer_html(&self.0.doc.borrow(), node)
    }

    pub fn instance(&self, host: NodeId) -> Option<Rc<Instance>> {
        self.0.instances.borrow().get(&host).cloned()
    }

    pub fn instance_by_id(&self, id: ComponentId) -> Option<Rc<Instance>> {
        self.0
            .instances
            .borrow()
            .values()
            .find(|i| i.id == id)
            .cloned()
    }

    pub fn instance_count(&self) -> usize {
        self.0.instances.borrow().len()
    }

    /// Hosts that were discovered but could not be resolved.
    pub fn is_failed(&self, host: NodeId) -> bool {
        self.0.failed.borrow().contains(&host)
    }

    /// Failures recorded while rendering nested components or reacting to
    /// state changes, oldest first.
    pub fn take_errors(&self) -> Vec<RuntimeError> {
        std::mem::take(&mut *self.0.errors.borrow_mut())
    }

    fn record(&self, err: RuntimeError) {
        self.0.errors.borrow_mut().push(err);
    }

    /// Resolve every component host at or below `root`. Unregistered
    /// components are logged and skipped; the first fatal failure is
    /// returned after the remaining hosts have been attempted.
    #[instrument(level = "debug", skip(self))]
    pub fn load(&self, root: NodeId) -> Result<(), RuntimeError> {
        let mut first = None;
        loop {
            let next = {
                let doc = self.0.doc.borrow();
                let instances = self.0.instances.borrow();
                let failed = self.0.failed.borrow();
                doc.descendants(root).into_iter().find(|n| {
                    self.is_host(&doc, *n) && !instances.contains_key(n) && !failed.contains(n)
                })
            };
            let Some(host) = next else { break };
            match self.resolve(host) {
                Ok(_) | Err(RuntimeError::Unregistered { .. }) => {}
                Err(e) => {
                    if first.is_none() {
                        first = Some(e);
                    }
                }
            }
        }
        match first {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn is_host(&self, doc: &Document, node: NodeId) -> bool {
        match doc.kind(node) {
            Some(NodeKind::Element { tag, .. }) => {
                is_component_host(tag, &doc.attributes(node), &self.0.config)
            }
            _ => false,
        }
    }

    /// Walk the lifecycle for one host: Undiscovered -> Resolving ->
    /// Resolved. Returns the existing instance if there already is one.
    #[instrument(level = "debug", skip(self))]
    pub fn resolve(&self, host: NodeId) -> Result<Rc<Instance>, RuntimeError> {
        if let Some(inst) = self.instance(host) {
            return Ok(inst);
        }
        let (name, inputs) = {
            let doc = self.0.doc.borrow();
            if !self.is_host(&doc, host) {
                return Err(RuntimeError::NotAComponent(host));
            }
            let tag = doc.tag(host).unwrap_or_default();
            let marker = doc.attribute(host, &self.0.config.component_attr);
            let inputs = doc.meta(host).map(|m| m.inputs.clone()).unwrap_or_default();
            (controller_name(tag, marker), inputs)
        };

        let Some(factory) = self.0.registry.get(&name) else {
            error!(%name, ?host, "no controller registered for component");
            self.0.failed.borrow_mut().insert(host);
            return Err(RuntimeError::Unregistered { name });
        };

        let caps = Capabilities {
            element: ElementRef::new(host, &self.0.doc),
            loader: self.0.loader.borrow().clone(),
            detector: ChangeDetector::new(Rc::downgrade(&self.0), host),
            events: EventEmitter::new(Rc::downgrade(&self.0), host),
        };
        let controller = match factory(&caps) {
            Ok(c) => c,
            Err(source) => {
                self.0.failed.borrow_mut().insert(host);
                return Err(RuntimeError::Construction { name, source });
            }
        };
        let template = match compile(&controller.template, &self.0.config) {
            Ok(t) => t,
            Err(source) => {
                self.0.failed.borrow_mut().insert(host);
                return Err(RuntimeError::Markup { name, source });
            }
        };

        // Inputs land before observation so they are observed like any
        // other property.
        for (key, value) in inputs {
            controller.state.set(key, value);
        }

        let id = ComponentId(self.0.next_id.get());
        self.0.next_id.set(id.0 + 1);
        let inst = Rc::new(Instance {
            id,
            host,
            name,
            state: controller.state,
            hooks: controller.hooks,
            template,
            generation: RefCell::new(None),
            resolved: Cell::new(false),
            rendering: Cell::new(false),
            dirty: Cell::new(false),
            mounted: Cell::new(false),
            renders: Cell::new(0),
        });
        self.0.instances.borrow_mut().insert(host, inst.clone());

        let runtime = Rc::downgrade(&self.0);
        let weak_inst = Rc::downgrade(&inst);
        observe(
            &Value::from(inst.state.clone()),
            Notifier::new(move || notify(&runtime, &weak_inst)),
        );
        // Set before the first render so discovery inside it cannot
        // resolve this host again.
        inst.resolved.set(true);
        debug!(name = %inst.name, ?host, id = id.0, "component resolved");

        self.render(&inst)?;
        Ok(inst)
    }

    /// Run compile -> evaluate -> diff -> patch for `inst`. A request that
    /// arrives while the component is already rendering marks it dirty and
    /// the in-flight call runs another pass.
    pub fn render(&self, inst: &Rc<Instance>) -> Result<(), RuntimeError> {
        if inst.rendering.get() {
            inst.dirty.set(true);
            return Ok(());
        }
        inst.rendering.set(true);
        let mut passes = 0;
        let result = loop {
            inst.dirty.set(false);
            passes += 1;
            if let Err(e) = self.render_pass(inst) {
                break Err(e);
            }
            if !inst.dirty.get() {
                break Ok(());
            }
            if passes >= self.0.config.max_render_passes {
                warn!(
                    name = %inst.name,
                    passes,
                    "render kept invalidating itself; dropping remaining passes"
                );
                inst.dirty.set(false);
                break Ok(());
            }
        };
        inst.rendering.set(false);
        result?;

        if !inst.mounted.get() {
            inst.mounted.set(true);
            inst.hooks.run_mounted(&inst.state);
        }
        Ok(())
    }

    #[instrument(level = "debug", skip_all, fields(name = %inst.name, pass = inst.renders.get() + 1))]
    fn render_pass(&self, inst: &Rc<Instance>) -> Result<(), RuntimeError> {
        let next = {
            let globals = self.0.globals.borrow().clone();
            let mut scope = Scope::new(&inst.state, &self.0.config).with_globals(&globals);
            resolve(&inst.template, &mut scope, Some(inst.id))?
        };

        let previous = inst.generation.borrow_mut().take();
        let writes = {
            let mut doc = self.0.doc.borrow_mut();
            // First pass diffs against whatever the host holds right now.
            let previous = previous.unwrap_or_else(|| doc.virtual_children(inst.host));
            patch_children(&mut doc, inst.host, &previous, &next, &self.0.config)?
        };
        *inst.generation.borrow_mut() = Some(next);
        inst.renders.set(inst.renders.get() + 1);
        debug!(writes, "patched");

        self.discover(inst);
        inst.hooks.run_changed(&inst.state);
        Ok(())
    }

    /// Resolve new hosts and refresh existing ones inside `inst`'s subtree.
    /// Failures are logged and kept; they never abort the parent.
    fn discover(&self, inst: &Instance) {
        let hosts = {
            let doc = self.0.doc.borrow();
            self.child_hosts(&doc, inst.host)
        };
        for host in hosts {
            if self.is_failed(host) {
                continue;
            }
            let result = match self.instance(host) {
                Some(child) => self.refresh(&child),
                None => self.resolve(host).map(|_| ()),
            };
            match result {
                Ok(()) | Err(RuntimeError::Unregistered { .. }) => {}
                Err(e) => {
                    error!(parent = %inst.name, ?host, error = %e, "nested component failed");
                    self.record(e);
                }
            }
        }
        self.prune();
    }

    /// Hosts below `root`, without entering other hosts.
    fn child_hosts(&self, doc: &Document, root: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = doc.children(root).iter().rev().copied().collect();
        while let Some(n) = stack.pop() {
            if self.is_host(doc, n) {
                out.push(n);
            } else {
                stack.extend(doc.children(n).iter().rev().copied());
            }
        }
        out
    }

    /// Push the host's current inputs into an existing child and re-render it.
    fn refresh(&self, child: &Rc<Instance>) -> Result<(), RuntimeError> {
        let meta = self.0.doc.borrow().meta(child.host);
        if let Some(meta) = meta {
            for (key, value) in &meta.inputs {
                child.state.set_quiet(key.as_str(), value.clone());
            }
        }
        self.render(child)
    }

    fn prune(&self) {
        let doc = self.0.doc.borrow();
        self.0.instances.borrow_mut().retain(|host, inst| {
            let keep = doc.is_attached(*host);
            if !keep {
                debug!(name = %inst.name, ?host, "dropping detached component");
            }
            keep
        });
        self.0.failed.borrow_mut().retain(|host| doc.is_attached(*host));
    }

    /// Fire the listeners `node` has for `event` and return how many ran.
    /// Each listener sees the node's loop locals plus the event object under
    /// the configured event key; both are gone once it returns.
    #[instrument(level = "debug", skip(self, detail))]
    pub fn dispatch(&self, node: NodeId, event: &str, detail: Value) -> Result<usize, RuntimeError> {
        let Some(meta) = self.0.doc.borrow().meta(node) else {
            return Ok(0);
        };
        let Some(owner) = meta.owner.and_then(|id| self.instance_by_id(id)) else {
            debug!(?node, event, "event target has no live owner");
            return Ok(0);
        };

        let globals = self.0.globals.borrow().clone();
        let mut fired = 0;
        for listener in meta.listeners_for(event) {
            let payload = Object::new()
                .with("type", event)
                .with("target", node.index())
                .with("detail", detail.clone());
            let mut scope = Scope::new(&owner.state, &self.0.config)
                .with_globals(&globals)
                .with_locals(meta.locals.iter().cloned());
            scope.push_local(self.0.config.event_key.as_str(), Value::from(payload));
            evaluate(&listener.expression, &mut scope);
            fired += 1;
        }
        Ok(fired)
    }
}

fn notify(runtime: &Weak<RuntimeInner>, inst: &Weak<Instance>) {
    let (Some(inner), Some(inst)) = (runtime.upgrade(), inst.upgrade()) else {
        return;
    };
    let runtime = Runtime(inner);
    // Ignore instances already pruned from the runtime.
    let live = runtime
        .instance(inst.host)
        .is_some_and(|current| Rc::ptr_eq(&current, &inst));
    if !live || !inst.resolved.get() {
        return;
    }
    if let Err(e) = runtime.render(&inst) {
        error!(name = %inst.name, error = %e, "re-render failed");
        runtime.record(e);
    }
}

impl fmt::Debug for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("registry", &self.0.registry)
            .field("instances", &self.0.instances.borrow().len())
            .finish()
    }
}
