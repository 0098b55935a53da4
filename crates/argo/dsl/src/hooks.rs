//! Post-compile template hooks
//!
//! A hook is a pure `Template -> Template` function. Hooks run in the order
//! they were registered, each receiving the previous hook's output.

use argo_types::{Manifest, Template};
use tracing::debug;

/// A single post-compile transformation
pub type Hook = Box<dyn Fn(Template) -> Template + Send + Sync>;

/// Ordered list of hooks
#[derive(Default)]
pub struct HookChain {
    hooks: Vec<Hook>,
}

impl HookChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push<F>(&mut self, hook: F)
    where
        F: Fn(Template) -> Template + Send + Sync + 'static,
    {
        self.hooks.push(Box::new(hook));
    }

    pub fn with<F>(mut self, hook: F) -> Self
    where
        F: Fn(Template) -> Template + Send + Sync + 'static,
    {
        self.push(hook);
        self
    }

    /// Append every hook of `other`, keeping its order
    pub fn extend(&mut self, other: HookChain) {
        self.hooks.extend(other.hooks);
    }

    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    /// Run every hook left to right
    pub fn apply(&self, template: Template) -> Template {
        if !self.hooks.is_empty() {
            debug!(template = %template.name, hooks = self.hooks.len(), "Applying hooks");
        }
        self.hooks.iter().fold(template, |template, hook| hook(template))
    }
}

impl std::fmt::Debug for HookChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HookChain")
            .field("len", &self.hooks.len())
            .finish()
    }
}

/// Replace the image of a script or container template
pub fn force_image(image: impl Into<String>) -> impl Fn(Template) -> Template + Send + Sync + Clone {
    let image = image.into();
    move |mut template: Template| {
        match &mut template.manifest {
            Manifest::Script(script) => script.image = image.clone(),
            Manifest::Container(container) => container.image = Some(image.clone()),
            Manifest::Resource(_) => {}
        }
        template
    }
}

/// Replace the command of a script or container template
pub fn with_command<I, S>(command: I) -> impl Fn(Template) -> Template + Send + Sync + Clone
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let command: Vec<String> = command.into_iter().map(Into::into).collect();
    move |mut template: Template| {
        match &mut template.manifest {
            Manifest::Script(script) => script.command = Some(command.clone()),
            Manifest::Container(container) => container.command = Some(command.clone()),
            Manifest::Resource(_) => {}
        }
        template
    }
}
