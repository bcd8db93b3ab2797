use crate::ast::{BinderInfo, FVarId, Term};
use crate::name::Name;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::rc::Rc;

/// A hypothesis or local definition visible to a goal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalDecl {
    pub fvar_id: FVarId,
    pub user_name: Name,
    pub ty: Rc<Term>,
    /// Present for let-introduced hypotheses.
    pub value: Option<Rc<Term>>,
    pub binder_info: BinderInfo,
    /// Position in the owning context.
    pub index: usize,
}

impl LocalDecl {
    pub fn is_let(&self) -> bool {
        self.value.is_some()
    }
}

impl fmt::Display for LocalDecl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            Some(value) => write!(f, "{} : {} := {}", self.user_name, self.ty, value),
            None => write!(f, "{} : {}", self.user_name, self.ty),
        }
    }
}

/// Ordered collection of local declarations.
///
/// Declarations are only ever appended; ids are unique within a context and
/// the insertion order is the order in which hypotheses were introduced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocalContext {
    decls: Vec<LocalDecl>,
    index: HashMap<FVarId, usize>,
}

impl LocalContext {
    pub fn new() -> Self {
        LocalContext::default()
    }

    pub fn len(&self) -> usize {
        self.decls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decls.is_empty()
    }

    pub fn find(&self, id: FVarId) -> Option<&LocalDecl> {
        self.index.get(&id).map(|&i| &self.decls[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &LocalDecl> {
        self.decls.iter()
    }

    /// Append an assumption `name : ty`.
    ///
    /// Re-adding an id that is already present returns the existing entry
    /// untouched: a declaration is never mutated after creation.
    pub fn mk_local_decl(
        &mut self,
        fvar_id: FVarId,
        user_name: Name,
        ty: Rc<Term>,
        binder_info: BinderInfo,
    ) -> &LocalDecl {
        self.push(fvar_id, user_name, ty, None, binder_info)
    }

    /// Append a local definition `name : ty := value`.
    pub fn mk_let_decl(
        &mut self,
        fvar_id: FVarId,
        user_name: Name,
        ty: Rc<Term>,
        value: Rc<Term>,
    ) -> &LocalDecl {
        self.push(fvar_id, user_name, ty, Some(value), BinderInfo::Default)
    }

    fn push(
        &mut self,
        fvar_id: FVarId,
        user_name: Name,
        ty: Rc<Term>,
        value: Option<Rc<Term>>,
        binder_info: BinderInfo,
    ) -> &LocalDecl {
        let idx = match self.index.get(&fvar_id) {
            Some(&existing) => existing,
            None => {
                let idx = self.decls.len();
                self.decls.push(LocalDecl {
                    fvar_id,
                    user_name,
                    ty,
                    value,
                    binder_info,
                    index: idx,
                });
                self.index.insert(fvar_id, idx);
                idx
            }
        };
        &self.decls[idx]
    }

    /// Return `suggestion` if no declaration uses it, otherwise the first of
    /// `suggestion_1`, `suggestion_2`, ... that is unused.
    pub fn get_unused_name(&self, suggestion: &Name) -> Name {
        let taken: HashSet<&Name> = self.decls.iter().map(|decl| &decl.user_name).collect();
        if !taken.contains(suggestion) {
            return suggestion.clone();
        }
        let mut idx = 1;
        loop {
            let candidate = suggestion.append_index(idx);
            if !taken.contains(&candidate) {
                return candidate;
            }
            idx += 1;
        }
    }
}

impl fmt::Display for LocalContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, decl) in self.decls.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", decl)?;
        }
        Ok(())
    }
}
