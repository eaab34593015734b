//! An endpoint bundles the input, error output and output trees of one HTTP
//! operation.

use crate::assemble::TypedResult;
use crate::context::RequestContext;
use crate::encode::OutputValues;
use crate::failure::DeclarationError;
use crate::io::{empty, Io};
use crate::node::{Leaf, LeafKind, Node, NodeKind};
use std::fmt;

/// A validated endpoint description.
pub struct Endpoint<I, E, O> {
    name: Option<String>,
    input: Io<I>,
    error_output: Io<E>,
    output: Io<O>,
}

impl<I, E, O> Clone for Endpoint<I, E, O> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            input: self.input.clone(),
            error_output: self.error_output.clone(),
            output: self.output.clone(),
        }
    }
}

impl Endpoint<(), (), ()> {
    pub fn builder() -> EndpointBuilder<(), (), ()> {
        EndpointBuilder { name: None, input: empty(), error_output: empty(), output: empty() }
    }
}

impl<I, E, O> Endpoint<I, E, O>
where
    I: Send + 'static,
    E: Send + 'static,
    O: Send + 'static,
{
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn input(&self) -> &Io<I> {
        &self.input
    }

    pub fn error_output(&self) -> &Io<E> {
        &self.error_output
    }

    pub fn output(&self) -> &Io<O> {
        &self.output
    }

    /// Decodes and assembles the request value.
    ///
    /// The context must hand out the body up front when the input reads it,
    /// see [`Io::decode_and_assemble`].
    pub fn decode_request(&self, ctx: &mut dyn RequestContext) -> Result<TypedResult<I>, DeclarationError> {
        self.input.decode_and_assemble(ctx)
    }

    pub fn encode_output(&self, value: O) -> Result<OutputValues, DeclarationError> {
        self.output.encode(value)
    }

    pub fn encode_error(&self, value: E) -> Result<OutputValues, DeclarationError> {
        self.error_output.encode(value)
    }

    /// Short summary such as `GET /items/{id}`.
    pub fn describe(&self) -> String {
        let mut method = None;
        let mut path = String::new();

        for leaf in self.input.node().leaves() {
            match leaf.kind() {
                NodeKind::Leaf(Leaf::FixedMethod(fixed)) => method = Some(fixed.to_string()),
                NodeKind::Leaf(Leaf::FixedPath(segment)) => {
                    path.push('/');
                    path.push_str(segment);
                }
                NodeKind::Leaf(Leaf::PathCapture { name, .. }) => {
                    path.push_str("/{");
                    path.push_str(name.as_deref().unwrap_or("param"));
                    path.push('}');
                }
                NodeKind::Leaf(Leaf::PathsCapture { .. }) => path.push_str("/*"),
                _ => {}
            }
        }

        if path.is_empty() {
            path.push('/');
        }
        let summary = format!("{} {path}", method.unwrap_or_else(|| "*".to_string()));
        match &self.name {
            Some(name) => format!("[{name}] {summary}"),
            None => summary,
        }
    }
}

impl<I, E, O> fmt::Debug for Endpoint<I, E, O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Endpoint")
            .field("name", &self.name)
            .field("input", &self.input)
            .field("error_output", &self.error_output)
            .field("output", &self.output)
            .finish()
    }
}

/// Builder for [`Endpoint`]; every tree defaults to [`empty`].
pub struct EndpointBuilder<I, E, O> {
    name: Option<String>,
    input: Io<I>,
    error_output: Io<E>,
    output: Io<O>,
}

impl<I, E, O> EndpointBuilder<I, E, O> {
    #[must_use]
    pub fn name<S: Into<String>>(mut self, name: S) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn input<T>(self, input: Io<T>) -> EndpointBuilder<T, E, O> {
        EndpointBuilder { name: self.name, input, error_output: self.error_output, output: self.output }
    }

    pub fn error_output<T>(self, error_output: Io<T>) -> EndpointBuilder<I, T, O> {
        EndpointBuilder { name: self.name, input: self.input, error_output, output: self.output }
    }

    pub fn output<T>(self, output: Io<T>) -> EndpointBuilder<I, E, T> {
        EndpointBuilder { name: self.name, input: self.input, error_output: self.error_output, output }
    }

    /// Checks leaf directions and body counts.
    pub fn build(self) -> Result<Endpoint<I, E, O>, DeclarationError> {
        check_input(self.input.node())?;
        check_output(self.error_output.node())?;
        check_output(self.output.node())?;

        Ok(Endpoint { name: self.name, input: self.input, error_output: self.error_output, output: self.output })
    }
}

impl<I, E, O> fmt::Debug for EndpointBuilder<I, E, O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EndpointBuilder").field("name", &self.name).finish_non_exhaustive()
    }
}

fn check_input(root: &Node) -> Result<(), DeclarationError> {
    for leaf in root.leaves() {
        if !leaf.leaf_kind().is_some_and(LeafKind::is_input) {
            return Err(DeclarationError::NotAnInput { leaf: leaf.describe() });
        }
    }
    Ok(())
}

fn check_output(root: &Node) -> Result<(), DeclarationError> {
    for leaf in root.leaves() {
        if !leaf.leaf_kind().is_some_and(LeafKind::is_output) {
            return Err(DeclarationError::NotAnOutput { leaf: leaf.describe() });
        }
    }

    match root.body_leaves() {
        0 | 1 => Ok(()),
        found => Err(DeclarationError::MultipleBodies { found }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::SimpleRequest;
    use crate::encode::OutputBody;
    use crate::io::{get, header, json_body, path, path_param, paths, query_opt, status, status_code, string_body};
    use bytes::Bytes;
    use http::StatusCode;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Item {
        id: u32,
        name: String,
    }

    fn item_endpoint() -> Endpoint<(u32, Option<String>), (StatusCode, String), (Item,)> {
        Endpoint::builder()
            .name("get-item")
            .input(get().and(path("items")).and(path_param::<u32>("id")).and(query_opt::<String>("fields")))
            .error_output(status_code().and(string_body()))
            .output(json_body::<Item>())
            .build()
            .unwrap()
    }

    #[test]
    fn decodes_request_into_input_type() {
        let endpoint = item_endpoint();
        let mut req = SimpleRequest::get("/items/3?fields=name");
        let value = endpoint.decode_request(&mut req).unwrap().into_result().unwrap();
        assert_eq!(value, (3, Some("name".to_string())));
    }

    #[test]
    fn encodes_output_and_error() {
        let endpoint = item_endpoint();

        let ok = endpoint.encode_output((Item { id: 3, name: "pen".into() },)).unwrap();
        assert!(matches!(ok.body(), Some(OutputBody::Bytes { bytes, .. }) if bytes == &Bytes::from_static(br#"{"id":3,"name":"pen"}"#)));
        assert_eq!(ok.status(), None);

        let err = endpoint.encode_error((StatusCode::NOT_FOUND, "no such item".to_string())).unwrap();
        assert_eq!(err.status(), Some(StatusCode::NOT_FOUND));
    }

    #[test]
    fn describes_method_and_path() {
        assert_eq!(item_endpoint().describe(), "[get-item] GET /items/{id}");

        let files = Endpoint::builder().input(path("files").and(paths())).build().unwrap();
        assert_eq!(files.describe(), "* /files/*");
        assert_eq!(Endpoint::builder().build().unwrap().describe(), "* /");
    }

    #[test]
    fn rejects_two_output_bodies() {
        let err = Endpoint::builder().output(string_body().and(json_body::<Item>())).build().unwrap_err();
        assert_eq!(err, DeclarationError::MultipleBodies { found: 2 });
    }

    #[test]
    fn rejects_leaves_in_the_wrong_direction() {
        let err = Endpoint::builder().input(get().and(status(StatusCode::OK))).build().unwrap_err();
        assert!(matches!(err, DeclarationError::NotAnInput { .. }));

        let err = Endpoint::builder().output(path_param::<u32>("id")).build().unwrap_err();
        assert!(matches!(err, DeclarationError::NotAnOutput { leaf } if leaf == "path parameter `id`"));

        let err = Endpoint::builder().error_output(header::<u32>("x-a").and(query_opt::<u8>("b"))).build().unwrap_err();
        assert!(matches!(err, DeclarationError::NotAnOutput { .. }));
    }
}
