/// 検索フォームのページ
///
/// 各ボタンはJSONのアクションエンドポイントを呼び、返ってきたメッセージと
/// テーブルを描画する。値はすべて `textContent` で挿入する。
pub const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>Smart Search: Records &amp; Orders</title>
<style>
body { font-family: sans-serif; max-width: 56rem; margin: 2rem auto; }
label { display: block; margin-top: 0.5rem; }
.notice { padding: 0.4rem 0.6rem; margin: 0.3rem 0; border-radius: 4px; }
.success { background: #e6f4ea; } .info { background: #e8f0fe; }
.warning { background: #fef7e0; } .error { background: #fce8e6; }
table { border-collapse: collapse; margin-top: 0.5rem; }
td, th { border: 1px solid #ccc; padding: 0.2rem 0.5rem; }
</style>
</head>
<body>
<h1>Smart Search: Records &amp; Orders</h1>
<label>Email <input id="email" type="email" placeholder="example@domain.com"></label>
<label>Phone Number <input id="phone" type="text" placeholder="123-456-7890"></label>
<p>
<button data-action="/actions/orders/search">Search Orders</button>
<button data-action="/actions/records/fetch">Fetch Records</button>
<button data-action="/actions/orders/fetch">Fetch Orders</button>
</p>
<div id="result"></div>
<script>
function render(outcome) {
  const root = document.getElementById("result");
  root.replaceChildren();
  for (const notice of outcome.notices) {
    const div = document.createElement("div");
    div.className = "notice " + notice.level;
    div.textContent = notice.message;
    root.appendChild(div);
  }
  if (!outcome.table) return;
  const table = document.createElement("table");
  const head = table.insertRow();
  for (const column of outcome.table.columns) {
    const th = document.createElement("th");
    th.textContent = column;
    head.appendChild(th);
  }
  for (const row of outcome.table.rows) {
    const tr = table.insertRow();
    for (const cell of row) {
      tr.insertCell().textContent = cell === null ? "" : String(cell);
    }
  }
  root.appendChild(table);
}
for (const button of document.querySelectorAll("button[data-action]")) {
  button.addEventListener("click", async () => {
    button.disabled = true;
    try {
      const response = await fetch(button.dataset.action, {
        method: "POST",
        headers: { "Content-Type": "application/json" },
        credentials: "same-origin",
        body: JSON.stringify({
          email: document.getElementById("email").value,
          phone: document.getElementById("phone").value,
        }),
      });
      render(await response.json());
    } catch (e) {
      render({ notices: [{ level: "error", message: String(e) }] });
    } finally {
      button.disabled = false;
    }
  });
}
</script>
</body>
</html>
"#;
