//! In-memory host used by the integration tests
#![allow(dead_code)]

use anyhow::anyhow;
use async_trait::async_trait;
use bytebundle_build::{
    BundleInput, CompiledOutput, CompilerDelegate, DelegateCtor, DelegateOptions, ModuleGraph,
    PlaceholderHandle, PlaceholderModule,
};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

pub const INITIAL_SOURCE: &str = "export default {};";

/// Host module with an in-memory source
pub struct MemoryModule {
    id: String,
    source: RefCell<String>,
    pub rebuilds: Cell<usize>,
    pub rebuilt_sources: RefCell<Vec<String>>,
    failure: Option<String>,
    yields: usize,
}

impl MemoryModule {
    pub fn new(id: &str) -> Rc<Self> {
        Self::build(id, None, 0)
    }

    /// Module whose rebuild fails with `message`
    pub fn failing(id: &str, message: &str) -> Rc<Self> {
        Self::build(id, Some(message.to_string()), 0)
    }

    /// Module whose rebuild yields to the executor `yields` times first
    pub fn slow(id: &str, yields: usize) -> Rc<Self> {
        Self::build(id, None, yields)
    }

    fn build(id: &str, failure: Option<String>, yields: usize) -> Rc<Self> {
        Rc::new(Self {
            id: id.to_string(),
            source: RefCell::new(INITIAL_SOURCE.to_string()),
            rebuilds: Cell::new(0),
            rebuilt_sources: RefCell::new(Vec::new()),
            failure,
            yields,
        })
    }

    pub fn handle(self: &Rc<Self>) -> PlaceholderHandle {
        self.clone()
    }
}

#[async_trait(?Send)]
impl PlaceholderModule for MemoryModule {
    fn id(&self) -> String {
        self.id.clone()
    }

    fn source(&self) -> String {
        self.source.borrow().clone()
    }

    fn set_source(&self, source: &str) {
        *self.source.borrow_mut() = source.to_string();
    }

    async fn rebuild(&self) -> anyhow::Result<()> {
        for _ in 0..self.yields {
            tokio::task::yield_now().await;
        }
        self.rebuilds.set(self.rebuilds.get() + 1);
        self.rebuilt_sources.borrow_mut().push(self.source());
        match &self.failure {
            Some(message) => Err(anyhow!("{}", message)),
            None => Ok(()),
        }
    }
}

/// Module graph that records the calls made on it
#[derive(Debug, Default)]
pub struct MemoryGraph {
    pub usage_resets: usize,
    pub unseals: usize,
}

impl ModuleGraph for MemoryGraph {
    fn reset_usage_info(&mut self) {
        self.usage_resets += 1;
    }

    fn unseal(&mut self) {
        self.unseals += 1;
    }
}

/// Shared record of what scripted delegates saw
#[derive(Debug, Default)]
pub struct DelegateLog {
    pub constructed: Cell<usize>,
    pub compiles: Cell<usize>,
    pub options: RefCell<Vec<DelegateOptions>>,
    pub seen_components: RefCell<Vec<Vec<String>>>,
}

/// Delegate returning a fixed output, or failing
pub struct ScriptedDelegate {
    output: Result<CompiledOutput, String>,
    log: Rc<DelegateLog>,
}

#[async_trait(?Send)]
impl CompilerDelegate for ScriptedDelegate {
    async fn compile_bundle(&mut self, input: &BundleInput<'_>) -> anyhow::Result<CompiledOutput> {
        self.log.compiles.set(self.log.compiles.get() + 1);
        self.log.seen_components.borrow_mut().push(
            input
                .components
                .iter()
                .map(|c| c.path.display().to_string())
                .collect(),
        );
        self.output.clone().map_err(|message| anyhow!("{}", message))
    }
}

/// Constructor for a delegate that always produces `bytecode` / `data_segment`
pub fn scripted(bytecode: &[u8], data_segment: &str) -> (DelegateCtor, Rc<DelegateLog>) {
    scripted_result(Ok(CompiledOutput {
        bytecode: bytecode.to_vec(),
        data_segment: data_segment.to_string(),
    }))
}

/// Constructor for a delegate that always fails with `message`
pub fn failing_compiler(message: &str) -> (DelegateCtor, Rc<DelegateLog>) {
    scripted_result(Err(message.to_string()))
}

fn scripted_result(output: Result<CompiledOutput, String>) -> (DelegateCtor, Rc<DelegateLog>) {
    let log = Rc::new(DelegateLog::default());
    let shared = log.clone();
    let ctor: DelegateCtor = Rc::new(move |options| {
        shared.constructed.set(shared.constructed.get() + 1);
        shared.options.borrow_mut().push(options);
        Box::new(ScriptedDelegate {
            output: output.clone(),
            log: shared.clone(),
        }) as Box<dyn CompilerDelegate>
    });
    (ctor, log)
}
