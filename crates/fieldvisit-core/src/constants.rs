//! Constants shared across fieldvisit crates.

/// Directory under the base path that holds one folder per visit.
pub const PHOTOS_DIR: &str = "fotos";

/// Default ledger file name, created next to the photos directory.
pub const LEDGER_FILE_NAME: &str = "dados_campo.xlsx";

/// Default base directory when `FIELDVISIT_BASE_DIR` is not set.
pub const DEFAULT_BASE_DIR: &str = "formulario_campo";

/// Timezone used to pre-fill the visit date and time.
pub const DEFAULT_TIMEZONE: &str = "America/Sao_Paulo";

/// Extension given to every stored attachment, whatever its real format.
pub const ATTACHMENT_EXTENSION: &str = "jpg";

/// Image extensions accepted by the form layer.
pub const ALLOWED_IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

/// Photographers of the unit, in selection order.
pub const DEFAULT_ROSTER: &[&str] = &[
    "Adriano Godoi de Lara",
    "Cássio Henrique Reolon Ferreira da Silva",
    "Marcelo Barburino Valente",
    "Marcos Paulo de Souza",
    "Maria Nathalia Bortolotto Beghini",
    "Murilo Carlos de Souza",
    "Sandro Alberto Baracho",
];
