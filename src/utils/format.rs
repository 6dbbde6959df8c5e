/// Formatea una distancia para la UI: kilómetros con un decimal desde 1000 m,
/// metros enteros por debajo.
pub fn format_distance(meters: f64) -> String {
    let meters = meters.max(0.0).round();
    if meters >= 1000.0 {
        format!("{:.1} km", meters / 1000.0)
    } else {
        format!("{} m", meters as u64)
    }
}

/// Tiempo estimado restante, p. ej. "12 min" o "1 h 05 min".
pub fn format_duration(seconds: f64) -> String {
    let minutes = (seconds.max(0.0) / 60.0).round() as u64;
    if minutes >= 60 {
        format!("{} h {:02} min", minutes / 60, minutes % 60)
    } else {
        format!("{} min", minutes)
    }
}
