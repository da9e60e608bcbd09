//! Nested member tree of the program
//!
//! The root scope holds objects, functions and plain values by name. Target
//! paths resolve by walking objects from the root.

use std::collections::HashMap;

use hackkit_sdk::TargetPath;

use crate::error::ProgramError;
use crate::function::Function;
use crate::value::Value;

/// A named member of a scope
#[derive(Debug, Clone)]
pub enum Member {
    Object(Scope),
    Function(Function),
    Value(Value),
}

impl Member {
    /// The function stored in this member, if it is one
    pub fn as_function(&self) -> Option<&Function> {
        match self {
            Member::Function(f) => Some(f),
            _ => None,
        }
    }

    /// The object stored in this member, if it is one
    pub fn as_object(&self) -> Option<&Scope> {
        match self {
            Member::Object(scope) => Some(scope),
            _ => None,
        }
    }
}

/// An object: a table of named members
#[derive(Debug, Clone, Default)]
pub struct Scope {
    members: HashMap<String, Member>,
}

impl Scope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a direct member
    pub fn get(&self, name: &str) -> Option<&Member> {
        self.members.get(name)
    }

    /// Insert a direct member, returning the previous one
    pub fn insert(&mut self, name: &str, member: Member) -> Option<Member> {
        self.members.insert(name.to_string(), member)
    }

    /// Remove a direct member
    pub fn remove(&mut self, name: &str) -> Option<Member> {
        self.members.remove(name)
    }

    /// Check for a direct member
    pub fn contains(&self, name: &str) -> bool {
        self.members.contains_key(name)
    }

    /// Number of direct members
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Whether the scope has no members
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Names of direct members, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.members.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Walk to the object owning the last segment of `path`
    fn owner(&self, path: &TargetPath) -> Result<&Scope, ProgramError> {
        let mut scope = self;
        for segment in path.parent_segments() {
            scope = match scope.members.get(segment) {
                Some(Member::Object(inner)) => inner,
                Some(_) => {
                    return Err(ProgramError::NotAnObject {
                        path: path.to_string(),
                        segment: segment.to_string(),
                    })
                }
                None => {
                    return Err(ProgramError::MemberNotFound {
                        path: path.to_string(),
                        segment: segment.to_string(),
                    })
                }
            };
        }
        Ok(scope)
    }

    fn owner_mut(&mut self, path: &TargetPath) -> Result<&mut Scope, ProgramError> {
        let mut scope = self;
        for segment in path.parent_segments() {
            scope = match scope.members.get_mut(segment) {
                Some(Member::Object(inner)) => inner,
                Some(_) => {
                    return Err(ProgramError::NotAnObject {
                        path: path.to_string(),
                        segment: segment.to_string(),
                    })
                }
                None => {
                    return Err(ProgramError::MemberNotFound {
                        path: path.to_string(),
                        segment: segment.to_string(),
                    })
                }
            };
        }
        Ok(scope)
    }

    /// Resolve a path
    ///
    /// Every segment but the last must be an object. The last segment may be
    /// missing, in which case `Ok(None)` is returned.
    pub fn resolve(&self, path: &TargetPath) -> Result<Option<&Member>, ProgramError> {
        Ok(self.owner(path)?.get(path.name()))
    }

    /// Resolve a path to a function
    ///
    /// Returns `Ok(None)` for an undefined slot and an error when the slot holds
    /// something that is not callable.
    pub fn function(&self, path: &TargetPath) -> Result<Option<Function>, ProgramError> {
        match self.resolve(path)? {
            None | Some(Member::Value(Value::Null)) => Ok(None),
            Some(Member::Function(f)) => Ok(Some(f.clone())),
            Some(_) => Err(ProgramError::NotAFunction(path.to_string())),
        }
    }

    /// Store a function at `path`, returning the previous member
    ///
    /// The owning object must already exist.
    pub fn set_function(
        &mut self,
        path: &TargetPath,
        function: Function,
    ) -> Result<Option<Member>, ProgramError> {
        let owner = self.owner_mut(path)?;
        Ok(owner.insert(path.name(), Member::Function(function)))
    }

    /// Store a plain value at `path`, returning the previous member
    pub fn set_value(&mut self, path: &TargetPath, value: Value) -> Result<Option<Member>, ProgramError> {
        let owner = self.owner_mut(path)?;
        Ok(owner.insert(path.name(), Member::Value(value)))
    }

    /// Make sure an object exists at `path`, creating missing objects on the way
    pub fn ensure_object(&mut self, path: &TargetPath) -> Result<&mut Scope, ProgramError> {
        let mut scope = self;
        for segment in path.segments() {
            let member = scope
                .members
                .entry(segment.to_string())
                .or_insert_with(|| Member::Object(Scope::new()));
            scope = match member {
                Member::Object(inner) => inner,
                _ => {
                    return Err(ProgramError::NotAnObject {
                        path: path.to_string(),
                        segment: segment.to_string(),
                    })
                }
            };
        }
        Ok(scope)
    }
}
