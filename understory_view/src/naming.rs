// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! View naming: qualify a declared name with its owner state.
//!
//! A declared name containing `@` is already qualified and used verbatim.
//! Otherwise the owner segment is the state bound by the nearest ancestor
//! placeholder, or empty when there is no ancestor or it has nothing bound.
//!
//! ```
//! use understory_view::naming::qualify;
//!
//! assert_eq!(qualify("", None).as_str(), "@");
//! assert_eq!(qualify("detail", Some("users")).as_str(), "detail@users");
//! assert_eq!(qualify("side@home", Some("users")).as_str(), "side@home");
//! ```

use crate::placeholder::Placeholder;
use crate::types::ViewName;

/// Qualify `declared` with an explicit owner state name.
pub fn qualify(declared: &str, owner: Option<&str>) -> ViewName {
    if declared.contains('@') {
        return ViewName::new(declared);
    }
    ViewName::new(format!("{declared}@{}", owner.unwrap_or_default()))
}

/// Qualify `declared` using the state bound by `ancestor`.
pub fn resolve_view_name(declared: &str, ancestor: Option<&Placeholder>) -> ViewName {
    let owner = ancestor.and_then(Placeholder::bound_state_name);
    qualify(declared, owner.as_deref())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::placeholder::PlaceholderConfig;
    use crate::test_support::Fixture;
    use crate::types::{ResolvedLocals, StateNode};

    #[test]
    fn qualify_without_owner() {
        assert_eq!(qualify("", None), ViewName::new("@"));
        assert_eq!(qualify("main", None), ViewName::new("main@"));
        assert_eq!(qualify("main", Some("")), ViewName::new("main@"));
    }

    #[test]
    fn verbatim_when_already_qualified() {
        assert_eq!(qualify("@root", Some("x")), ViewName::new("@root"));
        assert_eq!(qualify("a@b@c", None), ViewName::new("a@b@c"));
    }

    #[test]
    fn ancestor_supplies_bound_state() {
        let fx = Fixture::new("");
        let users = StateNode::new("users");
        fx.show("users", [("@", ResolvedLocals::new(users).with_template("list"))]);
        let outer = fx.link_root(PlaceholderConfig::default()).unwrap();
        assert_eq!(outer.bound_state_name().as_deref(), Some("users"));
        assert_eq!(
            resolve_view_name("detail", Some(&outer)),
            ViewName::new("detail@users")
        );
        assert_eq!(resolve_view_name("detail", None), ViewName::new("detail@"));
    }

    #[test]
    fn ancestor_without_bound_state_yields_empty_owner() {
        let fx = Fixture::new("fallback");
        let outer = fx.link_root(PlaceholderConfig::default()).unwrap();
        assert_eq!(outer.bound_state_name(), None);
        assert_eq!(
            resolve_view_name("detail", Some(&outer)),
            ViewName::new("detail@")
        );
    }
}
