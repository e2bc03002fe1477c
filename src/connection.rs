//! Typed links from model outputs to model inputs.
//!
//! Output paths are resolved under the source model's `outputs` struct and input paths under the
//! destination model's `inputs` struct. Each input has at most one source.

use std::collections::HashMap;

use itertools::Itertools;

use rsis_schema::Port;

use crate::{
    model::{Location, ModelReference, ModelTable},
    resolver::PortResolver,
    Error,
};

const OUTPUTS: &str = "outputs";
const INPUTS: &str = "inputs";

/// Prefix `path` with `namespace` unless it already starts with it.
fn namespaced(namespace: &str, path: &str) -> String {
    match path.strip_prefix(namespace) {
        Some(rest) if rest.starts_with('.') => path.to_owned(),
        _ => format!("{namespace}.{path}"),
    }
}

/// Strip a leading `namespace.` from `path`.
fn local(namespace: &str, path: &str) -> String {
    path.strip_prefix(namespace)
        .and_then(|rest| rest.strip_prefix('.'))
        .unwrap_or(path)
        .to_owned()
}

/// Check that a source port may drive a destination port.
///
/// Element types and dimension tuples must be identical. Units are compared only when both ports
/// declare one.
pub fn check_compatible(source: &Port, destination: &Port, path: &str) -> Result<(), Error> {
    if source.r#type != destination.r#type {
        return Err(Error::TypeMismatch {
            path: path.to_owned(),
            expected: destination.r#type.to_string(),
            found: source.r#type.to_string(),
        });
    }
    if source.dims != destination.dims {
        return Err(Error::TypeMismatch {
            path: path.to_owned(),
            expected: format!("dimensions {:?}", destination.dims),
            found: format!("dimensions {:?}", source.dims),
        });
    }
    if let (Some(source_unit), Some(destination_unit)) = (&source.unit, &destination.unit) {
        if source_unit != destination_unit {
            return Err(Error::TypeMismatch {
                path: path.to_owned(),
                expected: format!("unit '{destination_unit}'"),
                found: format!("unit '{source_unit}'"),
            });
        }
    }
    Ok(())
}

/// Inbound connections per destination model.
#[derive(Debug, Default)]
pub struct ConnectionGraph {
    /// Destination input path and source, in the order inputs were first connected
    inbound: HashMap<ModelReference, Vec<(String, Location)>>,
}

impl ConnectionGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and record a link from `output` to `input`.
    ///
    /// Connecting an input that already has a source replaces the old source.
    pub fn connect(
        &mut self,
        resolver: &PortResolver<'_>,
        models: &ModelTable,
        output: Location,
        input: Location,
    ) -> Result<(), Error> {
        let source_model = models.get(&output.model)?;
        let destination_model = models.get(&input.model)?;

        let source = resolver.resolve(source_model, &namespaced(OUTPUTS, &output.path))?;
        let destination = resolver.resolve(destination_model, &namespaced(INPUTS, &input.path))?;
        check_compatible(source.port, destination.port, &input.to_string())?;

        let output = Location::new(output.model, local(OUTPUTS, &output.path));
        let input_path = local(INPUTS, &input.path);

        let inputs = self.inbound.entry(input.model.clone()).or_default();
        match inputs.iter_mut().find(|(path, _)| *path == input_path) {
            Some((_, source)) => {
                log::warn!(
                    "Input {}:{input_path} was connected to {source}; now connected to {output}",
                    input.model
                );
                *source = output;
            }
            None => {
                log::debug!("Connected {output} -> {}:{input_path}", input.model);
                inputs.push((input_path, output));
            }
        }
        Ok(())
    }

    /// Remove the link driving `input`, returning its source.
    pub fn remove_connection(&mut self, input: &Location) -> Option<Location> {
        let input_path = local(INPUTS, &input.path);
        let removed = self.inbound.get_mut(&input.model).and_then(|inputs| {
            let index = inputs.iter().position(|(path, _)| *path == input_path)?;
            Some(inputs.remove(index).1)
        });
        if removed.is_none() {
            log::warn!("Input {input} is not connected");
        }
        if self.inbound.get(&input.model).is_some_and(Vec::is_empty) {
            self.inbound.remove(&input.model);
        }
        removed
    }

    /// Every link as `(output, input)` pairs, grouped by destination model name.
    pub fn list_connections(&self) -> Vec<(Location, Location)> {
        self.inbound
            .keys()
            .sorted_unstable()
            .flat_map(|model| self.connections_for(model))
            .collect()
    }

    /// The links driving `model`'s inputs, in the order they were first connected.
    pub fn connections_for(&self, model: &ModelReference) -> Vec<(Location, Location)> {
        self.inbound
            .get(model)
            .map(|inputs| {
                inputs
                    .iter()
                    .map(|(path, source)| (source.clone(), Location::new(model, path.as_str())))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Links whose source or destination model no longer exists. They are reported, not removed.
    pub fn dangling(&self, models: &ModelTable) -> Vec<(Location, Location)> {
        self.list_connections()
            .into_iter()
            .filter(|(output, input)| {
                !models.contains(output.model.name()) || !models.contains(input.model.name())
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.inbound.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.inbound.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use rsis_schema::PrimitiveType;
    use rstest::rstest;

    use super::*;

    fn f64_port(dims: Vec<usize>, unit: &str) -> Port {
        Port::signal(PrimitiveType::Float64, dims).with_unit(unit)
    }

    #[rstest]
    #[case::identical(f64_port(vec![3], "m"), f64_port(vec![3], "m"), true)]
    #[case::unit_on_one_side(f64_port(vec![3], "m"), f64_port(vec![3], ""), true)]
    #[case::no_units(f64_port(vec![], ""), f64_port(vec![], ""), true)]
    #[case::different_units(f64_port(vec![3], "m"), f64_port(vec![3], "km"), false)]
    #[case::different_rank(f64_port(vec![3], "m"), f64_port(vec![3, 1], "m"), false)]
    #[case::scalar_vs_array(f64_port(vec![], ""), f64_port(vec![1], ""), false)]
    #[case::different_type(
        Port::signal(PrimitiveType::Float32, vec![3]),
        f64_port(vec![3], ""),
        false
    )]
    fn test_check_compatible(#[case] source: Port, #[case] destination: Port, #[case] ok: bool) {
        let result = check_compatible(&source, &destination, "b:pos");
        assert_eq!(result.is_ok(), ok, "{result:?}");
    }

    #[test]
    fn test_namespacing() {
        assert_eq!(namespaced(OUTPUTS, "pos"), "outputs.pos");
        assert_eq!(namespaced(OUTPUTS, "outputs.pos"), "outputs.pos");
        assert_eq!(namespaced(OUTPUTS, "outputsx.pos"), "outputs.outputsx.pos");
        assert_eq!(local(INPUTS, "inputs.pos"), "pos");
        assert_eq!(local(INPUTS, "pos"), "pos");
    }
}
