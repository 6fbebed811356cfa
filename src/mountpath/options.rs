use super::installer::DEFAULT_METHODS;
use crate::intercept::Surface;
use crate::methods::RouteMethod;

/// Which registration methods [`install_with`](super::install_with) instruments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallOptions {
    pub methods: Vec<RouteMethod>,
    pub surfaces: Vec<Surface>,
}

impl Default for InstallOptions {
    /// `use`, `get`, `post`, `put`, `delete` and `patch` on both applications
    /// and routers.
    fn default() -> Self {
        Self {
            methods: DEFAULT_METHODS.to_vec(),
            surfaces: Surface::ALL.to_vec(),
        }
    }
}

impl InstallOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn methods(mut self, methods: impl IntoIterator<Item = RouteMethod>) -> Self {
        self.methods = methods.into_iter().collect();
        self
    }

    /// Adds one method to the instrumented set.
    pub fn method(mut self, method: RouteMethod) -> Self {
        if !self.methods.contains(&method) {
            self.methods.push(method);
        }
        self
    }

    pub fn surfaces(mut self, surfaces: impl IntoIterator<Item = Surface>) -> Self {
        self.surfaces = surfaces.into_iter().collect();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_cover_the_common_verbs() {
        let options = InstallOptions::default();
        assert_eq!(options.methods.len(), 6);
        assert!(options.methods.contains(&RouteMethod::Use));
        assert!(!options.methods.contains(&RouteMethod::All));
        assert_eq!(options.surfaces, Surface::ALL.to_vec());
    }

    #[test]
    fn builder_methods() {
        let options = InstallOptions::new()
            .methods([RouteMethod::Use])
            .method(RouteMethod::All)
            .method(RouteMethod::All)
            .surfaces([Surface::Router]);

        assert_eq!(options.methods, vec![RouteMethod::Use, RouteMethod::All]);
        assert_eq!(options.surfaces, vec![Surface::Router]);
    }
}
