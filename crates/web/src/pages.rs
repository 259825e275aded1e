//! Server-rendered HTML.
//!
//! Every page shares the same header and navigation tiles; the body depends on the session's
//! current [`Page`]. All dynamic text goes through [`escape`].

use repas_core::{DaySlot, Notice, Page, RecipeChoice, RecipeView};
use std::fmt::Write;

const STYLE: &str = "\
body{font-family:sans-serif;max-width:960px;margin:0 auto;padding:16px;background:#fafafa}\
.tiles{display:flex;gap:12px;flex-wrap:wrap;margin-top:12px}\
.tile{background:#fff;border:0;border-radius:10px;padding:14px;flex:1;min-width:180px;\
box-shadow:0 4px 12px rgba(0,0,0,0.06);cursor:pointer;text-align:center}\
.tile h4{margin:6px 0}\
.notice{padding:8px 12px;border-radius:6px;margin:6px 0}\
.success{background:#e6f4ea}.info{background:#e8f0fe}.warning{background:#fef7e0}.error{background:#fce8e6}\
.slot{display:flex;gap:12px;align-items:center;margin:8px 0}";

const MISSING_KEYS: &str = "Supabase keys manquantes. Configure SUPABASE_URL et \
SUPABASE_SERVICE_ROLE_KEY dans les secrets ou variables d'environnement.";

/// One row of the planning grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanningRow {
    pub slot: DaySlot,
    /// Assignments already recorded for this slot this week.
    pub assigned: usize,
    /// `Some` while the recipe picker is open.
    pub picker: Option<Vec<RecipeChoice>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageBody {
    Home,
    Recettes(Vec<RecipeView>),
    Planning(Vec<PlanningRow>),
    Liste,
}

impl PageBody {
    pub fn page(&self) -> Page {
        match self {
            PageBody::Home => Page::Home,
            PageBody::Recettes(_) => Page::Recettes,
            PageBody::Planning(_) => Page::Planning,
            PageBody::Liste => Page::Liste,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PageContext {
    pub configured: bool,
    pub notices: Vec<Notice>,
    pub body: PageBody,
}

/// Escapes text for use in element content and quoted attributes.
pub fn escape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

pub fn render(ctx: &PageContext) -> String {
    let mut html = String::new();
    html.push_str("<!DOCTYPE html><html lang=\"fr\"><head><meta charset=\"utf-8\">");
    html.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">");
    let _ = write!(html, "<title>Repas</title><style>{}</style></head><body>", STYLE);

    if !ctx.configured {
        notice(&mut html, &Notice::warning(MISSING_KEYS));
    }

    html.push_str("<h1>Organiser ses repas</h1>");
    html.push_str("<h3>Navigation rapide</h3>");
    html.push_str("<p>Clique sur une tuile pour ouvrir la page correspondante.</p>");
    html.push_str("<div class=\"tiles\">");
    tile(&mut html, Page::Recettes, "📚 Recettes", "Voir et ajouter des recettes");
    tile(&mut html, Page::Planning, "📅 Planning", "Organiser vos repas");
    tile(&mut html, Page::Liste, "🛒 Liste de courses", "Gérer la liste");
    html.push_str("</div><hr>");

    for n in &ctx.notices {
        notice(&mut html, n);
    }

    match &ctx.body {
        PageBody::Home => {
            notice(
                &mut html,
                &Notice::info("Page d'accueil. Clique une tuile pour tester les pages."),
            );
        }
        PageBody::Recettes(recipes) => recettes(&mut html, recipes),
        PageBody::Planning(rows) => planning(&mut html, rows),
        PageBody::Liste => {
            html.push_str("<h2>Liste de courses</h2>");
            html.push_str("<p>Page de test pour la liste de courses</p>");
        }
    }

    if ctx.body.page() != Page::Home {
        let _ = write!(
            html,
            "<form method=\"post\" action=\"/navigate\">\
             <input type=\"hidden\" name=\"page\" value=\"{}\">\
             <button type=\"submit\">⬅️ Retour à l'accueil</button></form>",
            Page::Home
        );
    }

    html.push_str("</body></html>");
    html
}

fn notice(html: &mut String, notice: &Notice) {
    let _ = write!(
        html,
        "<div class=\"notice {}\">{}</div>",
        notice.level.as_str(),
        escape(&notice.message)
    );
}

fn tile(html: &mut String, page: Page, title: &str, subtitle: &str) {
    let _ = write!(
        html,
        "<form method=\"post\" action=\"/navigate\">\
         <input type=\"hidden\" name=\"page\" value=\"{}\">\
         <button class=\"tile\" type=\"submit\"><h4>{}</h4><div>{}</div></button></form>",
        page, title, subtitle
    );
}

fn recettes(html: &mut String, recipes: &[RecipeView]) {
    html.push_str("<h2>Recettes</h2>");
    html.push_str(
        "<form method=\"post\" action=\"/recipes\" enctype=\"multipart/form-data\">\
         <label>Nom de la recette <input type=\"text\" name=\"name\"></label><br>\
         <label>Image ou PDF <input type=\"file\" name=\"file\" \
         accept=\".png,.jpg,.jpeg,.pdf\"></label><br>\
         <button type=\"submit\">Créer la recette</button></form><hr>",
    );

    html.push_str("<h3>Liste des recettes</h3>");
    if recipes.is_empty() {
        notice(html, &Notice::info("Aucune recette pour le moment"));
        return;
    }
    for recipe in recipes {
        let _ = write!(html, "<div class=\"recipe\"><p><strong>{}</strong></p>", escape(&recipe.name));
        if let Some(url) = &recipe.image_url {
            let _ = write!(
                html,
                "<img src=\"{}\" width=\"240\" alt=\"{}\">",
                escape(url),
                escape(&recipe.name)
            );
        }
        if let Some(url) = &recipe.pdf_url {
            let _ = write!(html, "<p><a href=\"{}\">Télécharger le PDF</a></p>", escape(url));
        }
        html.push_str("</div><hr>");
    }
}

fn planning(html: &mut String, rows: &[PlanningRow]) {
    html.push_str("<h2>Planning</h2><p>Page de test pour le planning</p>");
    for row in rows {
        let slot = row.slot.as_str();
        let _ = write!(
            html,
            "<div class=\"slot\"><span>{}</span><span>({})</span>\
             <form method=\"post\" action=\"/planning/{}/assign\">\
             <button type=\"submit\">Assigner {}</button></form></div>",
            slot, row.assigned, slot, slot
        );

        let Some(choices) = &row.picker else {
            continue;
        };
        let _ = write!(html, "<form method=\"post\" action=\"/planning/{}/confirm\">", slot);
        if !choices.is_empty() {
            html.push_str("<label>Choisir recette <select name=\"recipe_id\">");
            for choice in choices {
                let _ = write!(
                    html,
                    "<option value=\"{}\">{}</option>",
                    escape(&choice.id),
                    escape(&choice.name)
                );
            }
            html.push_str("</select></label>");
        }
        html.push_str("<button type=\"submit\">Valider assignation</button></form>");
    }
}
