//! Shared constants for the integration tests.

// ============================================================================
// Population
// ============================================================================

/// Seeded population, as `(ID, Movie)` pairs.
pub const POPULATION: [(i64, &str); 10] = [
    (1, "Abre los ojos"),
    (2, "Volver"),
    (3, "Los otros"),
    (4, "Tesis"),
    (5, "Mar adentro"),
    (6, "El orfanato"),
    (7, "Los lunes al sol"),
    (8, "Todo sobre mi madre"),
    (9, "El laberinto del fauno"),
    (10, "Hable con ella"),
];

/// Case-insensitive query matching ids 1, 3 and 7.
#[allow(dead_code)]
pub const LOS_QUERY: &str = "LOS";

// ============================================================================
// Dataset
// ============================================================================

#[allow(dead_code)]
pub const TITLE_URL: &str = "https://www.imdb.com/title/tt0000001/";
