//! Table routing for corrected files
//!
//! Each published member name ends in a dot-delimited token naming its
//! dataset (`K3241.K03200Y0.D50111.EMPRECSV`). The token selects one of the
//! fixed destination tables; anything else is not loaded.

use std::path::Path;

use crate::constants::files::CORRECTED_MARKER;

/// Known identifier tokens and their destination tables
pub const TABLE_ROUTES: [(&str, &str); 10] = [
    ("EMPRECSV", "rfb_empresas"),
    ("ESTABELE", "rfb_estabelecimentos"),
    ("SOCIOCSV", "rfb_socios"),
    ("SIMPLES", "rfb_simples"),
    ("CNAECSV", "rfb_cnaes"),
    ("MOTIV", "rfb_motivos"),
    ("MUNIC", "rfb_municipios"),
    ("NATJU", "rfb_naturezas"),
    ("PAIS", "rfb_paises"),
    ("QUALS", "rfb_qualificacoes"),
];

/// Identifier token of a corrected file name, upper-cased
pub fn identifier_token(corrected_name: &str) -> String {
    let published = corrected_name.replacen(CORRECTED_MARKER, "", 1);
    published
        .rsplit('.')
        .next()
        .unwrap_or(published.as_str())
        .to_uppercase()
}

/// Destination table for a token, if it is one of the known datasets
pub fn table_for_token(token: &str) -> Option<&'static str> {
    TABLE_ROUTES
        .iter()
        .find(|(known, _)| *known == token)
        .map(|(_, table)| *table)
}

/// Destination table for a corrected file path
pub fn table_for(corrected_path: &Path) -> Option<&'static str> {
    let name = corrected_path.file_name()?.to_str()?;
    table_for_token(&identifier_token(name))
}
