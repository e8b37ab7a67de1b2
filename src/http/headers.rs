//! # Headers HTTP
//! src/http/headers.rs
//!
//! Mapa de headers con claves case-insensitive.
//!
//! Las claves se guardan en forma canónica MIME (`content-type` →
//! `Content-Type`), así que `Content-Type` y `content-type` caen en la misma
//! entrada. Los valores conservan su capitalización original y se guardan
//! en orden de llegada.

use std::collections::HashMap;

/// Headers de un request: clave canónica → lista ordenada de valores
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    entries: HashMap<String, Vec<String>>,
}

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Agrega un valor al final de la lista de `name`
    pub fn append(&mut self, name: &str, value: &str) {
        self.entries
            .entry(canonical_key(name))
            .or_default()
            .push(value.to_string());
    }

    /// Primer valor de `name`
    pub fn get(&self, name: &str) -> Option<&str> {
        self.get_all(name).first().map(|s| s.as_str())
    }

    /// Todos los valores de `name`, en orden de llegada
    pub fn get_all(&self, name: &str) -> &[String] {
        self.entries
            .get(&canonical_key(name))
            .map(|values| values.as_slice())
            .unwrap_or(&[])
    }

    /// Concatena un trozo de línea de continuación al último valor de `name`
    pub(crate) fn extend_last(&mut self, name: &str, continuation: &str) -> bool {
        match self
            .entries
            .get_mut(name)
            .and_then(|values| values.last_mut())
        {
            Some(last) => {
                if !last.is_empty() {
                    last.push(' ');
                }
                last.push_str(continuation);
                true
            }
            None => false,
        }
    }

    /// Itera sobre (clave, valores)
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Forma canónica de una clave MIME
///
/// La primera letra y toda letra que sigue a un `-` van en mayúscula, el
/// resto en minúscula. Si la clave contiene bytes que no son token
/// (espacios, por ejemplo) se devuelve sin tocar.
pub fn canonical_key(name: &str) -> String {
    if !name.bytes().all(is_token_byte) {
        return name.to_string();
    }

    let mut upper = true;
    name.chars()
        .map(|c| {
            let out = if upper {
                c.to_ascii_uppercase()
            } else {
                c.to_ascii_lowercase()
            };
            upper = c == '-';
            out
        })
        .collect()
}

fn is_token_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b"!#$%&'*+-.^_`|~".contains(&b)
}
