//! Static endpoint table: (verb, route template) -> endpoint descriptor.
//!
//! Built once when the router is assembled and only read afterwards. The
//! descriptor yields the canonical endpoint identifier the permission
//! resolver matches grants against.

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::HttpVerb;

/// One routed action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EndpointDescriptor {
    pub controller: String,
    pub action: String,
    pub route_param: Option<String>,
    pub anonymous: bool,
}

impl EndpointDescriptor {
    pub fn new(controller: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            controller: controller.into(),
            action: action.into(),
            route_param: None,
            anonymous: false,
        }
    }

    /// Route parameter name; surrounding braces (`{Id}`) or a leading colon are stripped.
    pub fn with_route_param(mut self, param: &str) -> Self {
        let name = param.trim().trim_start_matches(':').trim_start_matches('{').trim_end_matches('}');
        self.route_param = (!name.is_empty()).then(|| name.to_string());
        self
    }

    pub fn allow_anonymous(mut self) -> Self {
        self.anonymous = true;
        self
    }

    /// `Controller/Action[/RouteParam]`
    pub fn identifier(&self) -> String {
        match &self.route_param {
            Some(param) => format!("{}/{}/{}", self.controller, self.action, param),
            None => format!("{}/{}", self.controller, self.action),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct EndpointKey {
    verb: HttpVerb,
    route: String,
}

/// Lookup table from (verb, route template) to descriptor.
#[derive(Debug, Clone, Default)]
pub struct EndpointTable {
    entries: HashMap<EndpointKey, EndpointDescriptor>,
    anonymous_controllers: HashSet<String>,
}

impl EndpointTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `descriptor` for `verb` on `route` (the router's path template).
    pub fn route(mut self, verb: HttpVerb, route: &str, descriptor: EndpointDescriptor) -> Self {
        self.entries.insert(
            EndpointKey {
                verb,
                route: route.to_string(),
            },
            descriptor,
        );
        self
    }

    /// Mark every action of `controller` as anonymous-access.
    pub fn anonymous_controller(mut self, controller: &str) -> Self {
        self.anonymous_controllers.insert(controller.to_ascii_lowercase());
        self
    }

    pub fn lookup(&self, verb: HttpVerb, route: &str) -> Option<&EndpointDescriptor> {
        self.entries.get(&EndpointKey {
            verb,
            route: route.to_string(),
        })
    }

    /// Whether the action or its controller allows anonymous access.
    pub fn is_anonymous(&self, descriptor: &EndpointDescriptor) -> bool {
        descriptor.anonymous || self.anonymous_controllers.contains(&descriptor.controller.to_ascii_lowercase())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
