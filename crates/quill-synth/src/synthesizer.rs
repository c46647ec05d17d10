// SPDX-License-Identifier: (MIT OR Apache-2.0)

//! Turning forms into executables: interpret first, compile once hot.

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

use quill_form::{Executable, Form, Invocable, InvokeError, MethodType, Value};
use tracing::{debug, warn};

use crate::config::SynthConfig;
use crate::emit::{lower, Unit};
use crate::error::SynthResult;
use crate::interp::InterpretedForm;
use crate::link::Linker;
use crate::machine::CompiledEntry;

pub struct Synthesizer {
    config: SynthConfig,
    linker: Arc<dyn Linker>,
    compiled: Arc<AtomicU64>,
}

impl Synthesizer {
    pub fn new(config: SynthConfig, linker: Arc<dyn Linker>) -> Self {
        Synthesizer { config, linker, compiled: Arc::new(AtomicU64::new(0)) }
    }

    pub fn config(&self) -> &SynthConfig {
        &self.config
    }

    pub fn linker(&self) -> &Arc<dyn Linker> {
        &self.linker
    }

    /// Number of forms lowered and linked so far, by any path.
    pub fn compiled_count(&self) -> u64 {
        self.compiled.load(Ordering::Relaxed)
    }

    /// Lowers and links `form` immediately.
    pub fn compile(&self, form: &Form) -> SynthResult<Executable> {
        compile(form, self.linker.as_ref(), &self.compiled)
    }

    pub fn interpret(&self, form: Arc<Form>) -> SynthResult<Executable> {
        let interp = InterpretedForm::new(form, self.linker.as_ref(), self.config.trace_interpreter)?;
        Ok(Executable::new(interp))
    }

    /// The executable for a freshly generated form. Below the compile
    /// threshold the form is interpreted; the call that reaches it compiles.
    pub fn prepare(&self, form: Form) -> SynthResult<Executable> {
        if self.config.compile_threshold == 0 {
            return self.compile(&form);
        }
        let form = Arc::new(form);
        let interpreted =
            InterpretedForm::new(form.clone(), self.linker.as_ref(), self.config.trace_interpreter)?;
        let ty = form.signature().to_method_type();
        Ok(Executable::new(PreparedForm {
            form,
            ty,
            interpreted,
            calls: AtomicU32::new(0),
            threshold: self.config.compile_threshold,
            compiled: OnceLock::new(),
            linker: self.linker.clone(),
            compile_count: self.compiled.clone(),
        }))
    }

    /// Links every entry of `unit`, in unit order.
    pub fn load(&self, unit: &Unit) -> SynthResult<Vec<(String, Executable)>> {
        let mut loaded = Vec::with_capacity(unit.len());
        for entry in unit.entries() {
            let exec = CompiledEntry::link(entry.clone(), self.linker.as_ref())?;
            loaded.push((entry.name.clone(), Executable::new(exec)));
        }
        debug!(unit = unit.name(), entries = loaded.len(), "loaded unit");
        Ok(loaded)
    }
}

fn compile(form: &Form, linker: &dyn Linker, counter: &AtomicU64) -> SynthResult<Executable> {
    let code = lower(form.name(), form)?;
    let entry = CompiledEntry::link(Arc::new(code), linker)?;
    counter.fetch_add(1, Ordering::Relaxed);
    debug!(form = form.name(), "compiled form");
    Ok(Executable::new(entry))
}

struct PreparedForm {
    form: Arc<Form>,
    ty: MethodType,
    interpreted: InterpretedForm,
    calls: AtomicU32,
    threshold: u32,
    /// `Some` once compiled; `None` if compilation failed, in which case
    /// the form stays interpreted.
    compiled: OnceLock<Option<Executable>>,
    linker: Arc<dyn Linker>,
    compile_count: Arc<AtomicU64>,
}

impl PreparedForm {
    fn compiled(&self) -> Option<&Executable> {
        if let Some(done) = self.compiled.get() {
            return done.as_ref();
        }
        let calls = self.calls.fetch_add(1, Ordering::Relaxed).saturating_add(1);
        if calls < self.threshold {
            return None;
        }
        self.compiled
            .get_or_init(|| match compile(&self.form, self.linker.as_ref(), &self.compile_count) {
                Ok(exec) => Some(exec),
                Err(err) => {
                    warn!(form = self.form.name(), error = %err, "compilation failed; staying interpreted");
                    None
                }
            })
            .as_ref()
    }
}

impl Invocable for PreparedForm {
    fn name(&self) -> &str {
        self.form.name()
    }

    fn method_type(&self) -> &MethodType {
        &self.ty
    }

    fn call(&self, args: &[Value]) -> Result<Value, InvokeError> {
        match self.compiled() {
            Some(exec) => exec.invoke(args),
            None => self.interpreted.call(args),
        }
    }
}
