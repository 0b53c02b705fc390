use crate::model::DashboardData;

/// Render a self-contained HTML dashboard (data embedded as JSON).
///
/// Important: we avoid `format!()` because the HTML contains many `{}` from JS
/// template literals (e.g., `${x}`), which would conflict with Rust formatting.
pub fn render_dashboard(data: &DashboardData) -> anyhow::Result<String> {
    // `</` would let a service name close the script element early.
    let json = serde_json::to_string(data)?.replace("</", "<\\/");

    const TEMPLATE: &str = r##"<!doctype html>
<html>
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>Service Performance Metrics</title>
<style>
  body { font-family: system-ui, -apple-system, Segoe UI, Roboto, Arial, sans-serif; margin: 0; }
  header { padding: 12px 16px; border-bottom: 1px solid #ddd; display: flex; gap: 16px; align-items: center; }
  nav button { padding: 6px 12px; border: 1px solid #ddd; background: #fafafa; border-radius: 6px; cursor: pointer; }
  nav button.active { background: #e9f2ff; border-color: #cfe3ff; }
  .main { padding: 12px 16px; }
  .view { display: none; }
  .view.active { display: block; }

  .banner { padding: 8px 12px; border-radius: 6px; margin: 6px 0; font-size: 14px; }
  .banner.warn { background: #fff8e1; border: 1px solid #ffe08a; }
  .banner.error { background: #fdecea; border: 1px solid #f5a9a3; font-weight: 600; }
  .muted { color: #777; font-size: 12px; }

  table { border-collapse: collapse; margin-top: 8px; }
  th, td { border-bottom: 1px solid #eee; padding: 6px 8px; text-align: left; font-size: 14px; }
  th { position: sticky; top: 0; background: white; border-bottom: 1px solid #ddd; }
  .num { text-align: right; font-variant-numeric: tabular-nums; }
  .pos { color: #b3261e; }
  .neg { color: #1e7b34; }
  select { padding: 4px 6px; }
  svg text { font-size: 11px; }
  .chart { overflow-x: auto; margin: 12px 0; }
</style>
</head>
<body>
<header>
  <b id="dataset"></b>
  <nav>
    <button data-view="analytics">Analytics</button>
    <button data-view="reports">Reports</button>
    <button data-view="compare">Compare</button>
  </nav>
</header>

<div class="main">
  <section class="view" id="view-analytics">
    <div id="banners"></div>
    <h3>Overall statistics (ms)</h3>
    <table id="versionStats"></table>

    <h3>Average loading time per service</h3>
    <div class="chart" id="lineChart"></div>

    <h3>Average loading time per service (grouped)</h3>
    <div id="barAlerts"></div>
    <div class="chart" id="barChart"></div>

    <h3>Service distribution</h3>
    <label>Version <select id="boxVersion"></select></label>
    <table id="boxTable"></table>
  </section>

  <section class="view" id="view-reports">
    <label>File <select id="reportFile"></select></label>
    <div class="muted" id="reportMeta"></div>
    <table id="reportTable"></table>
  </section>

  <section class="view" id="view-compare">
    <label>Base <select id="compareA"></select></label>
    <label>Target <select id="compareB"></select></label>
    <label>Show
      <select id="compareFilter">
        <option value="all">all</option>
        <option value="positive">slower</option>
        <option value="negative">faster</option>
      </select>
    </label>
    <table id="compareTable"></table>
  </section>
</div>

<script>
// Embedded dashboard data (JSON object literal)
const DATA = __DATA__;

const COLORS = ["#4e79a7", "#f28e2b", "#e15759", "#76b7b2", "#59a14f", "#edc948", "#b07aa1", "#ff9da7"];

function escapeHtml(s) {
  return String(s)
    .replaceAll("&", "&amp;")
    .replaceAll("<", "&lt;")
    .replaceAll(">", "&gt;")
    .replaceAll('"', "&quot;")
    .replaceAll("'", "&#39;");
}

function fmt(x, digits) {
  if (x === null || x === undefined) return "";
  return Number(x).toFixed(digits === undefined ? 0 : digits);
}

function options(el, values, selected) {
  el.innerHTML = values.map(v =>
    `<option value="${escapeHtml(v)}"${v === selected ? " selected" : ""}>${escapeHtml(v)}</option>`
  ).join("");
}

function showView(name) {
  for (const s of document.querySelectorAll(".view")) s.classList.toggle("active", s.id === "view-" + name);
  for (const b of document.querySelectorAll("nav button")) b.classList.toggle("active", b.dataset.view === name);
  const url = new URL(window.location);
  url.searchParams.set("view", name);
  history.replaceState(null, "", url);
}

function renderBanners() {
  const html = DATA.warnings.map(w => `<div class="banner warn">${escapeHtml(w)}</div>`);
  if (DATA.error) html.push(`<div class="banner error">${escapeHtml(DATA.error)}</div>`);
  document.getElementById("banners").innerHTML = html.join("");
}

function renderVersionStats() {
  const head = `<tr><th>metric</th>${DATA.versions.map(v => `<th class="num">${escapeHtml(v)}</th>`).join("")}</tr>`;
  const rows = DATA.version_stats.map(r =>
    `<tr><td>${r.metric}</td>${r.values.map(x => `<td class="num">${fmt(x, 2)}</td>`).join("")}</tr>`
  );
  document.getElementById("versionStats").innerHTML = head + rows.join("");
}

// Shared SVG frame: services on x, milliseconds on y.
function chartFrame(services, maxY, drawSeries) {
  const W = Math.max(640, services.length * 48), H = 320, L = 50, B = 90, T = 10;
  const x = i => L + (i + 0.5) * (W - L) / Math.max(services.length, 1);
  const y = v => T + (H - T - B) * (1 - v / (maxY || 1));
  let svg = `<svg width="${W}" height="${H}">`;
  for (let k = 0; k <= 4; k++) {
    const v = maxY * k / 4;
    svg += `<line x1="${L}" x2="${W}" y1="${y(v)}" y2="${y(v)}" stroke="#eee"/>`;
    svg += `<text x="${L - 6}" y="${y(v) + 4}" text-anchor="end">${fmt(v)}</text>`;
  }
  services.forEach((s, i) => {
    svg += `<text transform="translate(${x(i)},${H - B + 12}) rotate(45)">${escapeHtml(s)}</text>`;
  });
  svg += drawSeries(x, y, (W - L) / Math.max(services.length, 1));
  DATA.versions.forEach((v, vi) => {
    svg += `<rect x="${L + vi * 110}" y="${H - 14}" width="10" height="10" fill="${COLORS[vi % COLORS.length]}"/>`;
    svg += `<text x="${L + vi * 110 + 14}" y="${H - 5}">${escapeHtml(v)}</text>`;
  });
  return svg + "</svg>";
}

function maxAverage() {
  let m = 0;
  for (const s of DATA.service_order) for (const v of DATA.service_averages[s]) if (v !== null) m = Math.max(m, v);
  return m * 1.1;
}

function renderLineChart() {
  const services = DATA.service_order;
  if (!services.length) { document.getElementById("lineChart").textContent = "No data"; return; }
  document.getElementById("lineChart").innerHTML = chartFrame(services, maxAverage(), (x, y) => {
    let out = "";
    DATA.versions.forEach((_, vi) => {
      const color = COLORS[vi % COLORS.length];
      const pts = [];
      services.forEach((s, i) => {
        const v = DATA.service_averages[s][vi];
        if (v !== null) pts.push([x(i), y(v)]);
      });
      if (pts.length) out += `<polyline fill="none" stroke="${color}" stroke-width="2" points="${pts.map(p => p.join(",")).join(" ")}"/>`;
      for (const [px, py] of pts) out += `<circle cx="${px}" cy="${py}" r="3" fill="${color}"/>`;
    });
    return out;
  });
}

function renderBarChart() {
  document.getElementById("barAlerts").innerHTML = DATA.bar_alerts
    .map(a => `<div class="banner ${a === DATA.error ? "error" : "warn"}">${escapeHtml(a)}</div>`).join("");
  const el = document.getElementById("barChart");
  if (!DATA.show_bar || !DATA.service_order.length) { el.innerHTML = ""; return; }
  const services = DATA.service_order;
  const n = DATA.versions.length;
  el.innerHTML = chartFrame(services, maxAverage(), (x, y, slot) => {
    let out = "";
    const w = slot * 0.8 / Math.max(n, 1);
    services.forEach((s, i) => {
      DATA.versions.forEach((_, vi) => {
        const v = DATA.service_averages[s][vi];
        if (v === null) return;
        const bx = x(i) - slot * 0.4 + vi * w;
        out += `<rect x="${bx}" y="${y(v)}" width="${w - 1}" height="${y(0) - y(v)}" fill="${COLORS[vi % COLORS.length]}"><title>${escapeHtml(s)} ${fmt(v)} ms</title></rect>`;
      });
    });
    return out;
  });
}

function renderBoxTable() {
  const version = document.getElementById("boxVersion").value;
  const rows = (DATA.box_stats[version] || []).map(b =>
    `<tr><td>${escapeHtml(b.service)}</td><td class="num">${fmt(b.min)}</td><td class="num">${fmt(b.median)}</td><td class="num">${fmt(b.avg)}</td><td class="num">${fmt(b.max)}</td></tr>`
  );
  document.getElementById("boxTable").innerHTML =
    `<tr><th>service</th><th class="num">min</th><th class="num">median</th><th class="num">average</th><th class="num">max</th></tr>` + rows.join("");
}

function renderReport() {
  const path = document.getElementById("reportFile").value;
  const report = DATA.reports.find(r => r.path === path);
  const table = document.getElementById("reportTable");
  if (!report) { table.innerHTML = ""; return; }
  document.getElementById("reportMeta").textContent = `${report.rows.length} rows`;
  const head = `<tr>${report.header.map(h => `<th>${escapeHtml(h)}</th>`).join("")}</tr>`;
  const rows = report.rows.map(r => `<tr>${r.map(c => `<td>${escapeHtml(c)}</td>`).join("")}</tr>`);
  table.innerHTML = head + rows.join("");
}

function renderCompare() {
  const a = document.getElementById("compareA").value;
  const b = document.getElementById("compareB").value;
  const filter = document.getElementById("compareFilter").value;
  const ia = DATA.versions.indexOf(a), ib = DATA.versions.indexOf(b);
  const rows = [];
  for (const s of DATA.service_order) {
    const va = DATA.service_averages[s][ia], vb = DATA.service_averages[s][ib];
    if (va === null || vb === null || va === undefined || vb === undefined) continue;
    const delta = vb - va;
    if (filter === "positive" && !(delta > 0)) continue;
    if (filter === "negative" && !(delta < 0)) continue;
    const pct = va ? (delta / va * 100) : null;
    const cls = delta > 0 ? "pos" : (delta < 0 ? "neg" : "");
    rows.push(`<tr><td>${escapeHtml(s)}</td><td class="num">${fmt(va)}</td><td class="num">${fmt(vb)}</td>` +
      `<td class="num ${cls}">${delta > 0 ? "+" : ""}${fmt(delta)}</td><td class="num ${cls}">${pct === null ? "" : fmt(pct, 1) + "%"}</td></tr>`);
  }
  document.getElementById("compareTable").innerHTML =
    `<tr><th>service</th><th class="num">${escapeHtml(a)}</th><th class="num">${escapeHtml(b)}</th><th class="num">delta</th><th class="num">change</th></tr>` +
    rows.join("");
}

const params = new URLSearchParams(window.location.search);
document.getElementById("dataset").textContent = DATA.dataset;
for (const b of document.querySelectorAll("nav button")) b.onclick = () => showView(b.dataset.view);

renderBanners();
renderVersionStats();
renderLineChart();
renderBarChart();

options(document.getElementById("boxVersion"), DATA.versions, params.get("version") || DATA.versions[0]);
document.getElementById("boxVersion").onchange = renderBoxTable;
renderBoxTable();

options(document.getElementById("reportFile"), DATA.reports.map(r => r.path), params.get("report") || "summary.csv");
document.getElementById("reportFile").onchange = renderReport;
renderReport();

options(document.getElementById("compareA"), DATA.versions, params.get("compareA") || DATA.compare.version_a);
options(document.getElementById("compareB"), DATA.versions, params.get("compareB") || DATA.compare.version_b);
document.getElementById("compareFilter").value = ["positive", "negative"].includes(params.get("filter")) ? params.get("filter") : "all";
for (const id of ["compareA", "compareB", "compareFilter"]) document.getElementById(id).onchange = renderCompare;
renderCompare();

const view = params.get("view");
showView(["analytics", "reports", "compare"].includes(view) ? view : "analytics");
</script>
</body>
</html>
"##;

    Ok(TEMPLATE.replace("__DATA__", &json))
}
