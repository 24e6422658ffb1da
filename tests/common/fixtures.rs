//! Portal page fixtures and mock helpers

use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// A sample point as the location page lists it: (id, utm_x, utm_y, huso)
pub type Point<'a> = (&'a str, &'a str, &'a str, &'a str);

/// One measurement row: (date, e_coli, enterococcus, observations)
pub type Row<'a> = (&'a str, &'a str, &'a str, &'a str);

/// Location page for one zone with the given sample points
///
/// Every value cell is closed on its own line, as the portal renders it.
pub fn location_page(municipality: &str, zone_name: &str, points: &[Point<'_>]) -> String {
    let mut page = format!(
        "<html><body>\n<table>\n\
         <tr><td class=\"nombreCampo\">Comunidad Autónoma:</td>\n<td class=\"valorCampoI\">Cataluña</td>\n</tr>\n\
         <tr><td class=\"nombreCampo\">Provincia:</td>\n<td class=\"valorCampoI\">Girona</td>\n</tr>\n\
         <tr><td class=\"nombreCampo\">Municipio:</td>\n<td class=\"valorCampoI\">{}</td>\n</tr>\n\
         <tr><td class=\"nombreCampo\">Zona Agua Baño:</td>\n<td class=\"valorCampoI\">{}</td>\n</tr>\n",
        municipality, zone_name
    );
    for (id, x, y, huso) in points {
        page.push_str(&format!(
            "<tr><td class=\"nombreCampo\">Denominación:</td>\n<td class=\"valorCampoI\">ES5170110M17048A PM{}</td>\n</tr>\n\
             <tr><td class=\"nombreCampo\">X:</td>\n<td class=\"valorCampoI\">{}</td>\n</tr>\n\
             <tr><td class=\"nombreCampo\">Y:</td>\n<td class=\"valorCampoI\">{}</td>\n</tr>\n\
             <tr><td class=\"nombreCampo\">Huso:</td>\n<td class=\"valorCampoI\">{}</td>\n</tr>\n",
            id, x, y, huso
        ));
    }
    page.push_str("</table>\n</body></html>\n");
    page
}

/// Samples page with one section per sample point
pub fn samples_page(sections: &[&[Row<'_>]]) -> String {
    let mut page = String::from("<html><body>\n<h2>Muestreos</h2>\n");
    for (i, rows) in sections.iter().enumerate() {
        page.push_str(&format!("<div>Punto Muestreo: PM{}</div>\n<table>\n", i + 1));
        for (date, e_coli, entero, obs) in rows.iter() {
            page.push_str(&format!(
                "<tr>\n<td class=\"valorCampoI\">{}</td>\n<td class=\"valorCampoI\">{}</td>\n\
                 <td class=\"valorCampoI\">{}</td>\n<td class=\"valorCampoI\">{}</td>\n</tr>\n",
                date, e_coli, entero, obs
            ));
        }
        page.push_str("</table>\n");
    }
    page.push_str("</body></html>\n");
    page
}

/// What the portal answers for a code with no bathing zone
pub fn no_zone_page() -> String {
    "<html><body>No se ha encontrado la zona</body></html>\n".to_string()
}

/// Encode fixture text the way the portal serves it (ISO-8859-1)
pub fn latin1(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| u8::try_from(u32::from(c)).expect("fixture text must be Latin-1"))
        .collect()
}

fn page_response(page: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(latin1(page), "text/html; charset=ISO-8859-1")
}

/// Serve the location page of `code`
pub async fn mount_location(server: &MockServer, code: u32, page: &str) {
    Mock::given(method("GET"))
        .and(path("/zona"))
        .and(query_param("codZona", code.to_string()))
        .respond_with(page_response(page))
        .mount(server)
        .await;
}

/// Serve the samples page of `code`
///
/// Registered with a higher priority than the location mock, which would
/// also match because it does not look at `pestanya`.
pub async fn mount_samples(server: &MockServer, code: u32, page: &str) {
    Mock::given(method("GET"))
        .and(path("/zona"))
        .and(query_param("codZona", code.to_string()))
        .and(query_param("pestanya", "3"))
        .respond_with(page_response(page))
        .with_priority(1)
        .mount(server)
        .await;
}

/// Serve both pages of `code`
pub async fn mount_zone(server: &MockServer, code: u32, location: &str, samples: &str) {
    mount_location(server, code, location).await;
    mount_samples(server, code, samples).await;
}
