use super::layers::LayerTape;

/// The record of a training-mode forward pass, one entry per layer in forward order.
///
/// Handing a `Tape` back to the model that produced it lets it compute the gradient of any
/// downstream scalar with respect to every parameter.
#[derive(Clone, Debug, Default)]
pub struct Tape {
    layers: Vec<LayerTape>,
}

impl Tape {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            layers: Vec::with_capacity(capacity),
        }
    }

    pub(crate) fn push(&mut self, layer: LayerTape) {
        self.layers.push(layer);
    }

    pub(crate) fn layers(&self) -> &[LayerTape] {
        &self.layers
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }
}
