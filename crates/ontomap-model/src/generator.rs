//! Fresh-variable generation.
//!
//! A generator remembers every name it has seen or issued. It is owned by a
//! single logical computation (one chase, one saturation call) and passed
//! explicitly; sharing one across concurrent callers is a bug.

use crate::term::Variable;
use ahash::AHashSet;

#[derive(Debug, Clone, Default)]
pub struct VariableGenerator {
    known: AHashSet<String>,
    counter: u64,
}

impl VariableGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the generator with every variable the caller already holds,
    /// so freshly issued names cannot collide with them.
    pub fn from_variables<'a>(vars: impl IntoIterator<Item = &'a Variable>) -> Self {
        let mut gen = Self::default();
        gen.register(vars);
        gen
    }

    pub fn register<'a>(&mut self, vars: impl IntoIterator<Item = &'a Variable>) {
        for v in vars {
            self.known.insert(v.name().to_owned());
        }
    }

    pub fn knows(&self, v: &Variable) -> bool {
        self.known.contains(v.name())
    }

    /// Issues a fresh variable `f0`, `f1`, ... skipping known names.
    pub fn fresh(&mut self) -> Variable {
        loop {
            let name = format!("f{}", self.counter);
            self.counter += 1;
            if self.known.insert(name.clone()) {
                return Variable::new(name);
            }
        }
    }

    /// Issues a fresh variable derived from `v`'s name (`Xf0`, `Xf1`, ...),
    /// keeping renamings readable in traces.
    pub fn fresh_from(&mut self, v: &Variable) -> Variable {
        loop {
            let name = format!("{}f{}", v.name(), self.counter);
            self.counter += 1;
            if self.known.insert(name.clone()) {
                return Variable::new(name);
            }
        }
    }
}
